//! CAN identifier <-> (message group, message id, MAC) address codec.

use crate::error::PacketError;

/// Computes the 11-bit CAN identifier for a message group/id/MAC triple.
///
/// ```
/// use devicenet::addressing::can_addr;
/// assert_eq!(can_addr(2, 4, 1).unwrap(), 0x40C);
/// ```
pub fn can_addr(msg_group: u8, msg_id: u8, mac: u8) -> Result<u16, PacketError> {
    match msg_group {
        1 => {
            if msg_id > 15 {
                return Err(PacketError::BadField);
            }
        }
        2 => {
            if msg_id > 7 {
                return Err(PacketError::BadField);
            }
        }
        3 => {
            if msg_id > 6 {
                return Err(PacketError::BadField);
            }
        }
        4 => {
            if msg_id > 47 {
                return Err(PacketError::BadField);
            }
        }
        _ => return Err(PacketError::BadField),
    }

    if mac > 63 {
        return Err(PacketError::BadField);
    }

    let can_id = match msg_group {
        1 => (u16::from(msg_id) << 6) + u16::from(mac),
        2 => 0x400 + (u16::from(mac) << 3) + u16::from(msg_id),
        3 => 0x600 + (u16::from(msg_id) << 6) + u16::from(mac),
        4 => 0x7C0 + u16::from(msg_id),
        _ => unreachable!(),
    };

    Ok(can_id)
}

/// Decomposes a CAN identifier into its (message group, message id, MAC) triple.
///
/// ```
/// use devicenet::addressing::devnet_addr;
/// assert_eq!(devnet_addr(0x40B).unwrap(), (2, 3, 1));
/// ```
pub fn devnet_addr(can_id: u16) -> Result<(u8, u8, u8), PacketError> {
    let group = match can_id {
        0x000..=0x3FF => 1,
        0x400..=0x5FF => 2,
        0x600..=0x7BF => 3,
        0x7C0..=0x7EF => 4,
        _ => return Err(PacketError::BadAddress),
    };

    let (msg_id, mac) = match group {
        1 => (((can_id & 0x3C0) >> 6) as u8, (can_id & 0x03F) as u8),
        2 => ((can_id & 0x007) as u8, ((can_id & 0x1F8) >> 3) as u8),
        3 => (((can_id & 0x1C0) >> 6) as u8, (can_id & 0x03F) as u8),
        4 => ((can_id & 0x03F) as u8, 0),
        _ => unreachable!(),
    };

    Ok((group, msg_id, mac))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn explicit_request_address() {
        assert_eq!(can_addr(2, 4, 1).unwrap(), 0x40C);
    }

    #[test]
    fn explicit_response_address_round_trips() {
        let (group, msg_id, mac) = devnet_addr(0x40B).unwrap();
        assert_eq!((group, msg_id, mac), (2, 3, 1));
        assert_eq!(can_addr(group, msg_id, mac).unwrap(), 0x40B);
    }

    #[test]
    fn rejects_out_of_range_group() {
        assert_eq!(can_addr(5, 0, 0), Err(PacketError::BadField));
    }

    #[test]
    fn rejects_out_of_range_mac() {
        assert_eq!(can_addr(1, 0, 64), Err(PacketError::BadField));
    }

    #[test]
    fn rejects_unmapped_can_id() {
        assert_eq!(devnet_addr(0x7F5), Err(PacketError::BadAddress));
    }

    /// Property-based check (spec.md §8, law 1): `from_can(to_can(g, m,
    /// a)) == (g, m, a)` for randomly sampled valid triples across every
    /// message group.
    #[test]
    fn address_round_trip_holds_for_random_valid_triples() {
        extern crate std;
        use rand::Rng;

        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let group = rng.gen_range(1..=4u8);
            let msg_id = match group {
                1 => rng.gen_range(0..=15u8),
                2 => rng.gen_range(0..=7u8),
                3 => rng.gen_range(0..=6u8),
                _ => rng.gen_range(0..=47u8),
            };
            let mac = if group == 4 { 0 } else { rng.gen_range(0..=63u8) };

            let can_id = can_addr(group, msg_id, mac).unwrap();
            assert_eq!(devnet_addr(can_id).unwrap(), (group, msg_id, mac));
        }
    }
}
