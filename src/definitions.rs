//! Constant tables for the DeviceNet protocol: CAN-ID ranges, message
//! group/id pairs, service codes, fragmentation masks, allocation-choice
//! bitflags and the CIP general status error table.

use bitflags::bitflags;

/// CAN identifier address ranges for the four DeviceNet message groups.
pub mod can_id {
    pub const GROUP1_START: u16 = 0x000;
    pub const GROUP1_END: u16 = 0x3FF;
    pub const GROUP2_START: u16 = 0x400;
    pub const GROUP2_END: u16 = 0x5FF;
    pub const GROUP3_START: u16 = 0x600;
    pub const GROUP3_END: u16 = 0x7BF;
    pub const GROUP4_START: u16 = 0x7C0;
    pub const GROUP4_END: u16 = 0x7EF;
}

/// Pre-defined master/slave message identifiers, per message group.
///
/// CIP Networks Library, Volume 3, DeviceNet Adaptation of CIP, Chapter 2.2/3.7.
pub mod message {
    pub mod group1 {
        pub const ID: u8 = 1;
        pub const MPOLL_RSP: u8 = 0x0C;
        pub const COS_SLAVE_MESSAGE: u8 = 0x0D;
        pub const BITSTROBE_RSP: u8 = 0x0E;
        pub const POLL_RSP: u8 = 0x0F;
        pub const COS_SLAVE_ACK: u8 = 0x0F;
        pub const CYCLIC_SLAVE_MESSAGE: u8 = 0x0D;
        pub const CYCLIC_SLAVE_ACK: u8 = 0x0F;
    }

    pub mod group2 {
        pub const ID: u8 = 2;
        pub const BITSTROBE_CMD: u8 = 0x00;
        pub const MPOLL_CMD: u8 = 0x01;
        pub const COS_MASTER_ACK: u8 = 0x02;
        pub const CYCLIC_MASTER_ACK: u8 = 0x02;
        pub const EXPLICIT_RSP: u8 = 0x03;
        pub const UNCONNECTED_RSP: u8 = 0x03;
        pub const EXPLICIT_REQ: u8 = 0x04;
        pub const POLL_CMD: u8 = 0x05;
        pub const COS_MASTER_MESSAGE: u8 = 0x05;
        pub const CYCLIC_MASTER_MESSAGE: u8 = 0x05;
        pub const UNCONNECTED_REQ: u8 = 0x06;
        pub const DUPMAC: u8 = 0x07;
    }

    pub mod group3 {
        pub const ID: u8 = 3;
        pub const UNCONNECTED_RSP: u8 = 0x05;
        pub const DEVICE_HEARTBEAT_RSP: u8 = 0x05;
        pub const DEVICE_SHUTDOWN_RSP: u8 = 0x05;
        pub const UNCONNECTED_REQ: u8 = 0x06;
        pub const DEVICE_HEARTBEAT_REQ: u8 = 0x06;
        pub const DEVICE_SHUTDOWN_REQ: u8 = 0x06;
        pub const INVALID: u8 = 0x07;
    }

    pub mod group4 {
        pub const ID: u8 = 4;
        pub const COMM_FAULT_RSP: u8 = 0x2C;
        pub const COMM_FAULT_REQ: u8 = 0x2D;
        pub const OFFLINE_OWNERSHIP_RSP: u8 = 0x2E;
        pub const OFFLINE_OWNERSHIP_REQ: u8 = 0x2F;
    }
}

/// Explicit (and unconnected) request/response group/message-id pairs.
pub mod explicit {
    use super::message::group2;
    pub const REQ_GROUP: u8 = group2::ID;
    pub const REQ: u8 = group2::EXPLICIT_REQ;
    pub const RSP_GROUP: u8 = group2::ID;
    pub const RSP: u8 = group2::EXPLICIT_RSP;
}

pub mod unconnected {
    use super::message::group2;
    pub const REQ_GROUP: u8 = group2::ID;
    pub const REQ: u8 = group2::UNCONNECTED_REQ;
    pub const RSP_GROUP: u8 = group2::ID;
    pub const RSP: u8 = group2::UNCONNECTED_RSP;
    pub const DUPMAC: u8 = group2::DUPMAC;
}

pub mod poll {
    use super::message::{group1, group2};
    pub const REQ_GROUP: u8 = group2::ID;
    pub const REQ: u8 = group2::POLL_CMD;
    pub const RSP_GROUP: u8 = group1::ID;
    pub const RSP: u8 = group1::POLL_RSP;
}

pub mod bitstrobe {
    use super::message::{group1, group2};
    pub const REQ_GROUP: u8 = group2::ID;
    pub const REQ: u8 = group2::BITSTROBE_CMD;
    pub const RSP_GROUP: u8 = group1::ID;
    pub const RSP: u8 = group1::BITSTROBE_RSP;
}

pub mod cos {
    pub mod master {
        use crate::definitions::message::group2;
        pub const REQ_GROUP: u8 = group2::ID;
        pub const REQ: u8 = group2::COS_MASTER_MESSAGE;
        pub const RSP_GROUP: u8 = group2::ID;
        pub const RSP: u8 = group2::COS_MASTER_ACK;
    }

    pub mod slave {
        use crate::definitions::message::group1;
        pub const REQ_GROUP: u8 = group1::ID;
        pub const REQ: u8 = group1::COS_SLAVE_MESSAGE;
        pub const RSP_GROUP: u8 = group1::ID;
        pub const RSP: u8 = group1::COS_SLAVE_ACK;
    }
}

pub mod cyclic {
    pub mod master {
        use crate::definitions::message::group2;
        pub const REQ_GROUP: u8 = group2::ID;
        pub const REQ: u8 = group2::CYCLIC_MASTER_MESSAGE;
        pub const RSP_GROUP: u8 = group2::ID;
        pub const RSP: u8 = group2::CYCLIC_MASTER_ACK;
    }

    pub mod slave {
        use crate::definitions::message::group1;
        pub const REQ_GROUP: u8 = group1::ID;
        pub const REQ: u8 = group1::CYCLIC_SLAVE_MESSAGE;
        pub const RSP_GROUP: u8 = group1::ID;
        pub const RSP: u8 = group1::CYCLIC_SLAVE_ACK;
    }
}

/// CIP service request codes.
pub mod service {
    pub const GET_ATTR_ALL: u8 = 0x01;
    pub const SET_ATTR_ALL: u8 = 0x02;
    pub const GET_ATTR_LIST: u8 = 0x03;
    pub const SET_ATTR_LIST: u8 = 0x04;
    pub const RESET: u8 = 0x05;
    pub const START: u8 = 0x06;
    pub const STOP: u8 = 0x07;
    pub const CREATE: u8 = 0x08;
    pub const DELETE: u8 = 0x09;
    pub const MULT_PACKETS: u8 = 0x0A;
    pub const APPLY_ATTR: u8 = 0x0D;
    pub const GET_ATTR_SINGLE: u8 = 0x0E;
    pub const SET_ATTR_SINGLE: u8 = 0x10;
    pub const FIND_NEXT_INST: u8 = 0x11;
    pub const ERROR: u8 = 0x14;
    pub const RESTORE: u8 = 0x15;
    pub const SAVE: u8 = 0x16;
    pub const NOP: u8 = 0x17;
    pub const GET_MEMBER: u8 = 0x18;
    pub const SET_MEMBER: u8 = 0x19;
    pub const INSERT_MEMBER: u8 = 0x1A;
    pub const REMOVE_MEMBER: u8 = 0x1B;
    pub const GROUP_SYNC: u8 = 0x1C;
    pub const GET_CONN_POINT_MEMBER_LIST: u8 = 0x1D;
    pub const ALLOCATE: u8 = 0x4B;
    pub const RELEASE: u8 = 0x4C;
    pub const LAST_VALID_CODE: u8 = 0x7F;
}

/// Header bit layout constants shared by the explicit and DupMAC packets.
pub mod packet_bits {
    pub const FRAG_FLAG_MASK: u8 = 0x80;
    pub const FRAG_FLAG_OFFSET: u8 = 7;
    pub const XID_MASK: u8 = 0x40;
    pub const XID_OFFSET: u8 = 6;
    pub const MAC_MASK: u8 = 0x3F;
    pub const MAC_OFFSET: u8 = 0;
    pub const SERVICE_MASK: u8 = 0x7F;
    pub const SERVICE_OFFSET: u8 = 0;
    pub const RSP_FLAG_MASK: u8 = 0x80;
    pub const RSP_FLAG_OFFSET: u8 = 7;
    pub const PHYSICAL_PORT_MASK: u8 = 0x7F;
    pub const PHYSICAL_PORT_OFFSET: u8 = 0;
}

/// Fragmentation protocol constants.
pub mod fragment {
    pub const TYPE_MASK: u8 = 0xC0;
    pub const TYPE_OFFSET: u8 = 6;

    pub const TYPE_START: u8 = 0x00;
    pub const TYPE_MIDDLE: u8 = 0x01;
    pub const TYPE_FINAL: u8 = 0x02;
    pub const TYPE_ACK: u8 = 0x03;

    pub const ENABLED: u8 = 1;

    /// Sentinel fragment counter marking a single-fragment shortcut message.
    pub const MAX_COUNT: u8 = 0x3F;
}

/// CIP class/instance identifiers used by the Connection and DeviceNet objects.
pub mod class {
    pub const IDENTITY: u8 = 0x01;
    pub const MESSAGE_ROUTER: u8 = 0x02;
    pub const DEVICENET: u8 = 0x03;
    pub const ASSEMBLY: u8 = 0x04;
    pub const CONNECTION: u8 = 0x05;

    pub const IDENTITY_DEFAULT_INSTANCE: u8 = 0x01;
    pub const DEVICENET_DEFAULT_INSTANCE: u8 = 0x01;
}

/// Connection instance numbers, per connection type.
pub mod connection_instance {
    pub const EXPLICIT: u8 = 1;
    pub const POLL: u8 = 2;
    pub const BITSTROBE: u8 = 3;
    pub const COS: u8 = 4;
    pub const CYCLIC: u8 = 4;
    pub const MPOLL: u8 = 5;
}

bitflags! {
    /// Allocation-choice bitmask sent as part of the Allocate_Connection service.
    pub struct AllocChoice: u8 {
        const EXPLICIT  = 0x01;
        const POLL      = 0x02;
        const BITSTROBE = 0x04;
        const MPOLL     = 0x08;
        const COS       = 0x10;
        const CYCLIC    = 0x20;
        const ACKSUP    = 0x40;
    }
}

/// Connection timeout actions.
pub mod timeout_action {
    pub const TIMED_OUT: u8 = 0;
    pub const AUTO_DELETE: u8 = 1;
    pub const AUTO_RESET: u8 = 2;
    pub const DEFERRED: u8 = 3;
}

/// Connection lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    None,
    Configuring,
    WaitingForId,
    Established,
    TimedOut,
    Deferred,
    Closing,
}

/// The full CIP general status error code table.
pub struct CipErrorTable;

impl CipErrorTable {
    /// Look up the description for a CIP general status code.
    pub fn get(&self, code: u8) -> &'static str {
        match code {
            0x00 => "success",
            0x01 => "communication related problem",
            0x02 => "resource unavailable",
            0x03 => "invalid parameter value",
            0x04 => "path segment error",
            0x05 => "path destination unknown",
            0x06 => "partial transfer",
            0x07 => "connection lost",
            0x08 => "service not supported",
            0x09 => "invalid attribute value",
            0x0A => "attribute list error",
            0x0B => "already in requested mode/state",
            0x0C => "object state conflict",
            0x0D => "object already exists",
            0x0E => "attribute not settable",
            0x0F => "privilege violation",
            0x10 => "device state conflict",
            0x11 => "reply data too large",
            0x12 => "fragmentation of a primitive value",
            0x13 => "not enough data",
            0x14 => "attribute not supported",
            0x15 => "too much data",
            0x16 => "object instance does not exist",
            0x17 => "service fragmentation out of sequence",
            0x18 => "no stored attribute data",
            0x19 => "store operation failure",
            0x1A => "routing failure, request packet too large",
            0x1B => "routing failure, response packet too large",
            0x1C => "missing attribute list entry data",
            0x1D => "invalid attribute value list",
            0x1E => "embedded service error",
            0x1F => "vendor specific error",
            0x20 => "invalid parameter",
            0x21 => "write-once value or medium already written",
            0x22 => "invalid reply received",
            0x23 => "buffer overflow",
            0x24 => "message format error",
            0x25 => "key failure in path",
            0x26 => "path size invalid",
            0x27 => "unexpected attribute in list",
            0x28 => "invalid member id",
            0x29 => "member not settable",
            0x2A => "group 2 only server general failure",
            0x2B => "unknown vendor specific error",
            0x2C => "attribute not gettable",
            0x2D => "instance not deletable",
            0x2E => "service not supported for specified path",
            _ => "unknown status code",
        }
    }
}

/// Singleton handle used by [`crate::error::ProtocolError::service_description`].
pub static ERROR: CipErrorTable = CipErrorTable;
