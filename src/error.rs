
use strum::Display;

use crate::definitions::ERROR;

/// A malformed DeviceNet packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum PacketError {
    /// Frame payload was shorter or longer than the variant requires.
    #[strum(serialize = "payload length does not match the packet variant")]
    BadLength,

    /// A field carried a value outside its valid range.
    #[strum(serialize = "a field value is out of range")]
    BadField,

    /// The CAN identifier does not map to any known message group/id pair.
    #[strum(serialize = "CAN identifier does not map to a known message group")]
    BadAddress,

    /// The fragment header carried an unrecognised fragment type.
    #[strum(serialize = "unrecognised fragment type")]
    BadFragmentType,
}

/// Protocol-level errors produced by the link layer.
///
/// Generic over `E`, the underlying CAN bus error type, mirroring the way
/// transport errors are threaded through rather than boxed.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError<E> {
    /// The packet could not be decoded.
    Packet(PacketError),

    /// No response arrived before the configured timeout.
    NoResponse,

    /// The fragment acknowledgement reported a non-zero status.
    FragmentAck(u8),

    /// A gap was detected between two received fragment counters.
    FragmentMissing,

    /// The peer responded with a CIP general status error code.
    Service(u8),

    /// Wrapper for unhandled / underlying CAN bus errors.
    Bus(E),
}

impl<E> From<PacketError> for ProtocolError<E> {
    fn from(e: PacketError) -> Self {
        ProtocolError::Packet(e)
    }
}

impl<E> ProtocolError<E> {
    /// Human readable description of a `Service` error's CIP general status code.
    pub fn service_description(code: u8) -> &'static str {
        ERROR.get(code)
    }
}

impl<E: core::fmt::Debug> core::fmt::Display for ProtocolError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ProtocolError::Packet(e) => write!(f, "{}", e),
            ProtocolError::NoResponse => write!(f, "no response before the configured deadline"),
            ProtocolError::FragmentAck(status) => write!(f, "fragment acknowledge reported status {status:#x}"),
            ProtocolError::FragmentMissing => write!(f, "a fragment was lost (gap in fragment counter)"),
            ProtocolError::Service(code) => write!(f, "{} ({code:#04x})", ERROR.get(*code)),
            ProtocolError::Bus(e) => write!(f, "CAN bus error: {e:?}"),
        }
    }
}

#[cfg(test)]
mod test {
    extern crate std;

    use std::string::ToString;

    use super::*;

    #[test]
    fn packet_error_display_uses_strum() {
        assert_eq!(PacketError::BadAddress.to_string(), "CAN identifier does not map to a known message group");
    }

    #[test]
    fn protocol_error_service_display_includes_code() {
        let err: ProtocolError<()> = ProtocolError::Service(0x0C);
        assert_eq!(err.to_string(), "object state conflict (0x0c)");
    }

    #[test]
    fn protocol_error_wraps_packet_error() {
        let err: ProtocolError<()> = ProtocolError::from(PacketError::BadLength);
        assert_eq!(err, ProtocolError::Packet(PacketError::BadLength));
    }
}
