//! Integer and string byte-codec helpers shared by the packet and link layers.

use heapless::Vec;

/// Converts `value` to `size` little-endian bytes.
///
/// ```
/// use devicenet::convert::integer_to_bytes;
/// let stream: heapless::Vec<u8, 4> = integer_to_bytes(0xAABBCCDD, 4);
/// assert_eq!(&stream[..], &[0xDD, 0xCC, 0xBB, 0xAA]);
/// ```
pub fn integer_to_bytes<const N: usize>(value: u32, size: usize) -> Vec<u8, N> {
    let mut stream = Vec::new();
    for i in 0..size.min(N) {
        let byte = ((value >> (i * 8)) & 0xFF) as u8;
        let _ = stream.push(byte);
    }
    stream
}

/// Converts a little-endian byte slice back to an integer.
///
/// ```
/// use devicenet::convert::bytes_to_integer;
/// assert_eq!(bytes_to_integer(&[0xDD, 0xCC, 0xBB, 0xAA]), 0xAABBCCDD);
/// ```
pub fn bytes_to_integer(stream: &[u8]) -> u32 {
    let mut result: u32 = 0;
    for &b in stream.iter().rev() {
        result = result.wrapping_mul(256).wrapping_add(b as u32);
    }
    result
}

/// Encodes a UTF-8 string as a length-prefixed byte stream.
///
/// The total stream, including the length byte, is truncated to 255 bytes.
pub fn string_to_bytes<const N: usize>(value: &str) -> Vec<u8, N> {
    let bytes = value.as_bytes();
    let len = bytes.len().min(254).min(N.saturating_sub(1));

    let mut stream = Vec::new();
    let _ = stream.push(len as u8);
    for &b in &bytes[..len] {
        if stream.push(b).is_err() {
            break;
        }
    }
    stream
}

/// Decodes a length-prefixed byte stream back to a UTF-8 string, stripping
/// trailing NUL padding.
pub fn bytes_to_string<const N: usize>(stream: &[u8]) -> Vec<u8, N> {
    let mut out = Vec::new();
    if stream.is_empty() {
        return out;
    }

    let length = stream[0] as usize;
    let body = &stream[1..];
    let take = length.min(body.len());

    let mut end = take;
    while end > 0 && body[end - 1] == 0 {
        end -= 1;
    }

    for &b in &body[..end] {
        if out.push(b).is_err() {
            break;
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn integer_round_trip() {
        let stream: Vec<u8, 4> = integer_to_bytes(0xAABBCCDD, 4);
        assert_eq!(&stream[..], &[0xDD, 0xCC, 0xBB, 0xAA]);
        assert_eq!(bytes_to_integer(&stream), 0xAABBCCDD);
    }

    #[test]
    fn string_round_trip() {
        let stream: Vec<u8, 16> = string_to_bytes("Test");
        assert_eq!(&stream[..], &[4, b'T', b'e', b's', b't']);

        let decoded: Vec<u8, 16> = bytes_to_string(&stream);
        assert_eq!(&decoded[..], b"Test");
    }

    #[test]
    fn string_strips_trailing_nul() {
        let stream = [3u8, b'h', b'i', 0];
        let decoded: Vec<u8, 16> = bytes_to_string(&stream);
        assert_eq!(&decoded[..], b"hi");
    }
}
