//! A declarative CIP attribute catalog.
//!
//! This is intentionally thin: the link layer needs attribute byte-sizes to
//! build `Set_Attribute_Single` payloads and decode `Get_Attribute_Single`
//! responses, but no per-class behaviour (property getters, state
//! machines) lives here.

/// Scope of an attribute: class-level or instance-level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Class,
    Instance,
}

/// One attribute entry in a CIP class's declarative catalog.
#[derive(Debug, Clone, Copy)]
pub struct Attribute {
    pub scope: Scope,
    pub id: u8,
    pub name: &'static str,
    pub size: usize,
}

impl Attribute {
    pub const fn instance(id: u8, name: &'static str, size: usize) -> Self {
        Self {
            scope: Scope::Instance,
            id,
            name,
            size,
        }
    }

    pub const fn class(id: u8, name: &'static str, size: usize) -> Self {
        Self {
            scope: Scope::Class,
            id,
            name,
            size,
        }
    }
}

/// Looks up an attribute's declared byte size in `table` by id.
pub fn attribute_size(table: &[Attribute], id: u8) -> Option<usize> {
    table.iter().find(|a| a.id == id).map(|a| a.size)
}

/// Connection Object (class 0x05) instance attribute catalog.
///
/// Grounded in the attribute list used by the Connection Object's instance
/// attributes: state, type, transport class, produced/consumed connection
/// IDs and sizes, timeout action, connection path, timing parameters.
pub static CONNECTION_ATTRIBUTES: &[Attribute] = &[
    Attribute::instance(1, "conn_state", 1),
    Attribute::instance(2, "conn_type", 1),
    Attribute::instance(3, "transport_class", 1),
    Attribute::instance(4, "produced_conn_id", 2),
    Attribute::instance(5, "consumed_conn_id", 2),
    Attribute::instance(6, "initial_com", 1),
    Attribute::instance(7, "produced_conn_size", 2),
    Attribute::instance(8, "consumed_conn_size", 2),
    Attribute::instance(9, "expected_packet_rate", 2),
    Attribute::instance(10, "cip_produced_conn_id", 4),
    Attribute::instance(11, "cip_consumed_conn_id", 4),
    Attribute::instance(12, "timeout_action", 1),
    Attribute::instance(13, "produced_path_length", 2),
    Attribute::instance(14, "produced_conn_path", 16),
    Attribute::instance(15, "consumed_path_length", 2),
    Attribute::instance(16, "consumed_conn_path", 16),
    Attribute::instance(17, "inhibit_time", 2),
    Attribute::instance(18, "timeout_multiplier", 1),
    Attribute::instance(19, "binding_list", 16),
    Attribute::instance(100, "consume_assembly", 1),
    Attribute::instance(101, "produce_assembly", 1),
];

/// Identity Object (class 0x01) instance attribute catalog: the subset
/// needed by common diagnostic reads (vendor id, device type, product
/// code, revision, status, serial number, product name).
pub static IDENTITY_ATTRIBUTES: &[Attribute] = &[
    Attribute::instance(1, "vendor_id", 2),
    Attribute::instance(2, "device_type", 2),
    Attribute::instance(3, "product_code", 2),
    Attribute::instance(4, "revision", 2),
    Attribute::instance(5, "status", 2),
    Attribute::instance(6, "serial_number", 4),
    Attribute::instance(7, "product_name", 32),
];

/// DeviceNet Object (class 0x03) instance attribute catalog.
pub static DEVICENET_ATTRIBUTES: &[Attribute] = &[
    Attribute::instance(1, "mac_id", 1),
    Attribute::instance(2, "baud_rate", 1),
    Attribute::instance(3, "busoff_interrupt", 1),
    Attribute::instance(4, "bus_off_counter", 1),
    Attribute::instance(5, "allocation_information", 2),
    Attribute::instance(6, "mac_id_switch_changed", 1),
    Attribute::instance(7, "baud_rate_switch_changed", 2),
    Attribute::instance(8, "mac_id_switch_value", 1),
    Attribute::instance(9, "baud_rate_switch_value", 1),
];

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn looks_up_connection_attribute_size() {
        assert_eq!(attribute_size(CONNECTION_ATTRIBUTES, 9), Some(2));
        assert_eq!(attribute_size(CONNECTION_ATTRIBUTES, 200), None);
    }
}
