//! Messaging layer: encodes service requests and I/O exchanges to the
//! DeviceNet message format, drives fragmentation/reassembly, and tracks
//! the connection table used by explicit and I/O transfers.

use heapless::Vec;
use log::{trace, warn};

use crate::addressing::can_addr;
use crate::can::{CanBus, ListenGuard};
use crate::definitions::{
    bitstrobe, class, connection_instance, cos, explicit, fragment, poll, service, unconnected, AllocChoice,
    ConnectionState,
};
use crate::error::ProtocolError;
use crate::frag::{self, FragEvent, Reassembler};
use crate::packet::{
    frag_flag_of, CanFrame, DupMacPacket, ExplicitFragAckPacket, ExplicitFragPacket, ExplicitServicePacket, IoPacket,
    MAX_SERVICE_DATA,
};
use crate::LinkConfig;

/// CIP general status code returned when a response doesn't match the
/// expectations of the exchange that solicited it.
const INVALID_REPLY_RECEIVED: u8 = 0x22;

/// Maximum payload this crate will reassemble a single explicit or I/O
/// exchange into. Shares its bound with the packet layer's service-data
/// capacity since a fully reassembled message is exactly one logical
/// service-data (or I/O) payload.
pub const MAX_REASSEMBLY: usize = MAX_SERVICE_DATA;

/// A recorded connection instance, per spec.md's Connection data model.
///
/// `produced_size`/`consumed_size` start unset: allocation (service 0x4B)
/// only carries the allocation-choice bitmask and allocator MAC on the
/// wire, not connection sizes, so callers that need them populate these
/// fields themselves (e.g. from a `Connection` object's `produced_conn_size`/
/// `consumed_conn_size` attributes) once known.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub instance: u8,
    pub alloc_choice: AllocChoice,
    pub state: ConnectionState,
    pub ack_suppress: bool,
    pub produced_size: Option<usize>,
    pub consumed_size: Option<usize>,
}

impl Connection {
    fn new(instance: u8, alloc_choice: AllocChoice) -> Self {
        Self {
            instance,
            alloc_choice,
            state: ConnectionState::Established,
            ack_suppress: alloc_choice.contains(AllocChoice::ACKSUP),
            produced_size: None,
            consumed_size: None,
        }
    }
}

/// The connection table: one slot per connection instance (Explicit=1,
/// Poll=2, Bit-strobe=3, COS/Cyclic=4, Multicast poll=5).
#[derive(Debug, Clone, Default)]
pub struct ConnectionTable {
    slots: [Option<Connection>; 6],
}

impl ConnectionTable {
    pub fn new() -> Self {
        Self {
            slots: Default::default(),
        }
    }

    pub fn get(&self, instance: u8) -> Option<&Connection> {
        self.slots.get(instance as usize).and_then(|c| c.as_ref())
    }

    /// Records the produced/consumed sizes for an already-allocated
    /// connection, once known (e.g. read back from the Connection
    /// object's `produced_conn_size`/`consumed_conn_size` attributes).
    /// No-op if `instance` has no recorded connection.
    pub fn set_sizes(&mut self, instance: u8, produced_size: Option<usize>, consumed_size: Option<usize>) {
        if let Some(Some(connection)) = self.slots.get_mut(instance as usize) {
            connection.produced_size = produced_size;
            connection.consumed_size = consumed_size;
        }
    }

    fn set(&mut self, instance: u8, connection: Connection) {
        if let Some(slot) = self.slots.get_mut(instance as usize) {
            *slot = Some(connection);
        }
    }

    fn clear(&mut self, instance: u8) {
        if let Some(slot) = self.slots.get_mut(instance as usize) {
            *slot = None;
        }
    }

    /// Records the outcome of a successful allocation, including the
    /// implicit poll-connection bookkeeping that COS/Cyclic connections
    /// carry with them.
    fn record_allocation(&mut self, instance: u8, alloc_choice: AllocChoice) {
        self.set(instance, Connection::new(instance, alloc_choice));

        if alloc_choice.intersects(AllocChoice::COS | AllocChoice::CYCLIC) {
            self.set(
                connection_instance::POLL,
                Connection::new(connection_instance::POLL, AllocChoice::POLL),
            );
        }
    }

    fn record_release(&mut self, instance: u8, alloc_choice: AllocChoice) {
        self.clear(instance);
        if alloc_choice.intersects(AllocChoice::COS | AllocChoice::CYCLIC) {
            self.clear(connection_instance::POLL);
        }
    }
}

/// Sends an explicit service request and waits for the matching response.
///
/// The response listener is always torn down before returning, on every
/// exit path (success, timeout, or protocol error), per the link layer's
/// listener-lifecycle guarantee.
pub fn service_request<B: CanBus>(
    bus: &mut B,
    cfg: &LinkConfig,
    src_addr: u8,
    dst_addr: u8,
    service_code: u8,
    class_id: u8,
    instance_id: u8,
    data: &[u8],
    group_id: u8,
    message_id: u8,
    wait_time_ms: u32,
) -> Result<Vec<u8, MAX_REASSEMBLY>, ProtocolError<B::Error>> {
    service_request_xid(
        bus, cfg, src_addr, dst_addr, service_code, class_id, instance_id, data, group_id, message_id, wait_time_ms,
        false,
    )
}

/// As [`service_request`], with an explicit transaction-id bit for callers
/// (such as [`Node`]) that toggle it per outstanding transaction.
pub fn service_request_xid<B: CanBus>(
    bus: &mut B,
    cfg: &LinkConfig,
    src_addr: u8,
    dst_addr: u8,
    service_code: u8,
    class_id: u8,
    instance_id: u8,
    data: &[u8],
    group_id: u8,
    message_id: u8,
    wait_time_ms: u32,
    xid: bool,
) -> Result<Vec<u8, MAX_REASSEMBLY>, ProtocolError<B::Error>> {
    let request = ExplicitServicePacket {
        group_id,
        message_id,
        src_mac: src_addr,
        dst_mac: dst_addr,
        xid,
        response: false,
        service_code,
        class_id,
        instance_id,
        service_data: to_vec_n(data),
    };

    let rsp_can_id = can_addr(explicit::RSP_GROUP, explicit::RSP, dst_addr).map_err(ProtocolError::from)?;
    let mut guard = ListenGuard::new(bus, &[rsp_can_id]).map_err(ProtocolError::Bus)?;

    send_explicit(guard.bus(), &request, cfg)?;

    wait_response(guard.bus(), src_addr, dst_addr, service_code, wait_time_ms)
}

fn send_explicit<B: CanBus>(
    bus: &mut B,
    request: &ExplicitServicePacket,
    cfg: &LinkConfig,
) -> Result<(), ProtocolError<B::Error>> {
    if request.length() > 8 {
        for fragment in request.split() {
            let frame = fragment.build().map_err(ProtocolError::from)?;
            bus.send(&frame).map_err(ProtocolError::Bus)?;
            wait_fragment_ack(bus, cfg)?;
        }
    } else {
        let frame = request.build().map_err(ProtocolError::from)?;
        bus.send(&frame).map_err(ProtocolError::Bus)?;
    }
    Ok(())
}

/// Drives the explicit response-reception state machine (spec §4.4
/// `await_response`): byte 1 of an explicit frame is either a service
/// header or a fragment header depending on the message-header fragment
/// flag, so the frame is dispatched to the matching parser before anything
/// else is inspected.
fn wait_response<B: CanBus>(
    bus: &mut B,
    src_addr: u8,
    dst_addr: u8,
    service_code: u8,
    timeout_ms: u32,
) -> Result<Vec<u8, MAX_REASSEMBLY>, ProtocolError<B::Error>> {
    if service_code > service::LAST_VALID_CODE {
        return Err(ProtocolError::Service(INVALID_REPLY_RECEIVED));
    }

    loop {
        let frame = match bus.recv(timeout_ms).map_err(ProtocolError::Bus)? {
            Some(f) => f,
            None => return Err(ProtocolError::NoResponse),
        };

        if !frag_flag_of(&frame).map_err(ProtocolError::from)? {
            let response = ExplicitServicePacket::parse(&frame, explicit::RSP_GROUP, explicit::RSP)
                .map_err(ProtocolError::from)?;

            if response.service_code == service::ERROR {
                let code = response.service_data.get(0).copied().unwrap_or(0);
                return Err(ProtocolError::Service(code));
            }

            trace!("unfragmented explicit response received");
            return Ok(to_vec_n(&response.service_data));
        }

        let fragment = ExplicitFragPacket::parse(&frame, explicit::RSP_GROUP, explicit::RSP)
            .map_err(ProtocolError::from)?;

        if fragment.is_single_fragment() {
            trace!("single-fragment shortcut response received");
            return Ok(to_vec_n(&fragment.data));
        }

        if frag::is_start_fragment(fragment.frag_type, fragment.frag_count) {
            ack_fragment(bus, src_addr, dst_addr, 0)?;

            let mut out: Vec<u8, MAX_REASSEMBLY> = Vec::new();
            for &b in fragment.data.iter() {
                let _ = out.push(b);
            }

            let rest = read_fragment_explicit(bus, src_addr, dst_addr, timeout_ms)?;
            for &b in rest.iter() {
                let _ = out.push(b);
            }
            return Ok(out);
        }

        // A middle or final fragment arrived before its start fragment:
        // discard and keep waiting (spec §4.4 step 8).
        continue;
    }
}

fn to_vec_n(data: &[u8]) -> Vec<u8, MAX_REASSEMBLY> {
    let mut v = Vec::new();
    for &b in data {
        let _ = v.push(b);
    }
    v
}

fn read_fragment_explicit<B: CanBus>(
    bus: &mut B,
    src_addr: u8,
    dst_addr: u8,
    timeout_ms: u32,
) -> Result<Vec<u8, MAX_REASSEMBLY>, ProtocolError<B::Error>> {
    let mut reassembler: Reassembler<MAX_REASSEMBLY> = Reassembler::new(true);

    loop {
        let msg_in = bus.recv(timeout_ms).map_err(ProtocolError::Bus)?;
        let frame = match msg_in {
            Some(f) => f,
            None => break,
        };

        let response = ExplicitFragPacket::parse(&frame, explicit::RSP_GROUP, explicit::RSP)
            .map_err(ProtocolError::from)?;

        match reassembler.push(response.frag_count, &response.data) {
            FragEvent::Duplicate => {
                ack_fragment(bus, src_addr, dst_addr, response.frag_count)?;
            }
            FragEvent::Appended => {
                ack_fragment(bus, src_addr, dst_addr, response.frag_count)?;
            }
            FragEvent::Missing => {
                warn!("missing fragment detected during explicit reassembly");
                return Err(ProtocolError::FragmentMissing);
            }
        }

        if response.is_final() {
            break;
        }
    }

    Ok(reassembler.into_stream())
}

fn read_fragment_io<B: CanBus>(
    bus: &mut B,
    timeout_ms: u32,
) -> Result<Option<Vec<u8, MAX_REASSEMBLY>>, ProtocolError<B::Error>> {
    let mut reassembler: Reassembler<MAX_REASSEMBLY> = Reassembler::new(false);
    let mut received_any = false;

    loop {
        let msg_in = bus.recv(timeout_ms).map_err(ProtocolError::Bus)?;
        let frame = match msg_in {
            Some(f) => f,
            None => break,
        };

        received_any = true;
        let response = crate::packet::IoFragPacket::parse(&frame, poll::RSP_GROUP, poll::RSP)
            .map_err(ProtocolError::from)?;

        match reassembler.push(response.frag_count, &response.data) {
            FragEvent::Missing => warn!("missing fragment detected during I/O reassembly"),
            _ => {}
        }

        if response.is_final() {
            break;
        }
    }

    if received_any {
        Ok(Some(reassembler.into_stream()))
    } else {
        Ok(None)
    }
}

fn wait_fragment_ack<B: CanBus>(bus: &mut B, cfg: &LinkConfig) -> Result<(), ProtocolError<B::Error>> {
    for _ in 0..2 {
        if let Some(frame) = bus.recv(cfg.fragment_ack_timeout_ms).map_err(ProtocolError::Bus)? {
            let ack = ExplicitFragAckPacket::parse(&frame, explicit::REQ_GROUP, explicit::REQ)
                .map_err(ProtocolError::from)?;
            if ack.ack_status != 0 {
                return Err(ProtocolError::FragmentAck(ack.ack_status));
            }
            return Ok(());
        }
    }
    Err(ProtocolError::NoResponse)
}

fn ack_fragment<B: CanBus>(
    bus: &mut B,
    src_addr: u8,
    dst_addr: u8,
    frag_count: u8,
) -> Result<(), ProtocolError<B::Error>> {
    let ack = ExplicitFragAckPacket {
        group_id: explicit::REQ_GROUP,
        message_id: explicit::REQ,
        src_mac: src_addr,
        dst_mac: dst_addr,
        frag_count,
        ack_status: 0,
    };
    let frame = ack.build().map_err(ProtocolError::from)?;
    bus.send(&frame).map_err(ProtocolError::Bus)
}

/// Sends a bit-strobe command (broadcast I/O write) to `dst_addr`.
pub fn bitstrobe_write<B: CanBus>(
    bus: &mut B,
    master_addr: u8,
    slave_addr: u8,
    data: &[u8],
) -> Result<(), ProtocolError<B::Error>> {
    let command = IoPacket {
        group_id: bitstrobe::REQ_GROUP,
        message_id: bitstrobe::REQ,
        src_mac: master_addr,
        dst_mac: slave_addr,
        data: to_vec_n(data),
    };

    let rsp_id = can_addr(bitstrobe::RSP_GROUP, bitstrobe::RSP, slave_addr).map_err(ProtocolError::from)?;
    bus.start_listen(&[rsp_id]).map_err(ProtocolError::Bus)?;

    let frame = command.build().map_err(ProtocolError::from)?;
    bus.send(&frame).map_err(ProtocolError::Bus)
}

/// Receives the response to a previously sent bit-strobe command.
pub fn bitstrobe_read<B: CanBus>(
    bus: &mut B,
    timeout_ms: u32,
) -> Result<Option<Vec<u8, MAX_REASSEMBLY>>, ProtocolError<B::Error>> {
    let result = match bus.recv(timeout_ms).map_err(ProtocolError::Bus)? {
        Some(frame) => {
            let response = IoPacket::parse(&frame, bitstrobe::RSP_GROUP, bitstrobe::RSP)
                .map_err(ProtocolError::from)?;
            Some(response.data)
        }
        None => None,
    };
    bus.stop_listen().map_err(ProtocolError::Bus)?;
    Ok(result)
}

/// Sends a poll command; large payloads are fragmented, payloads that need
/// the fragmentation flag but fit in one frame use the single-fragment
/// shortcut sentinel.
pub fn poll_write<B: CanBus>(
    bus: &mut B,
    master_addr: u8,
    slave_addr: u8,
    consumed_size: usize,
    data: &[u8],
) -> Result<(), ProtocolError<B::Error>> {
    let rsp_id = can_addr(poll::RSP_GROUP, poll::RSP, slave_addr).map_err(ProtocolError::from)?;
    bus.start_listen(&[rsp_id]).map_err(ProtocolError::Bus)?;

    let command = IoPacket {
        group_id: poll::REQ_GROUP,
        message_id: poll::REQ,
        src_mac: master_addr,
        dst_mac: slave_addr,
        data: to_vec_n(data),
    };

    send_io_write(bus, &command, consumed_size, data.len())
}

fn send_io_write<B: CanBus>(
    bus: &mut B,
    command: &IoPacket,
    consumed_size: usize,
    data_size: usize,
) -> Result<(), ProtocolError<B::Error>> {
    let fragmentation = consumed_size > 8;

    if fragmentation && data_size >= 8 {
        for fragment in command.split() {
            let frame = fragment.build().map_err(ProtocolError::from)?;
            bus.send(&frame).map_err(ProtocolError::Bus)?;
        }
    } else if fragmentation && data_size < 8 {
        let mut shortcut = command.clone();
        let mut shifted: Vec<u8, MAX_REASSEMBLY> = Vec::new();
        let _ = shifted.push(fragment::MAX_COUNT);
        for &b in command.data.iter() {
            let _ = shifted.push(b);
        }
        shortcut.data = shifted;
        let frame = shortcut.build().map_err(ProtocolError::from)?;
        bus.send(&frame).map_err(ProtocolError::Bus)?;
    } else {
        let frame = command.build().map_err(ProtocolError::from)?;
        bus.send(&frame).map_err(ProtocolError::Bus)?;
    }

    Ok(())
}

/// Receives a poll response, reassembling if `produced_size` exceeds one frame.
pub fn poll_read<B: CanBus>(
    bus: &mut B,
    produced_size: usize,
    timeout_ms: u32,
) -> Result<Option<Vec<u8, MAX_REASSEMBLY>>, ProtocolError<B::Error>> {
    let result = if produced_size > 8 {
        read_fragment_io(bus, timeout_ms)?
    } else {
        match bus.recv(timeout_ms).map_err(ProtocolError::Bus)? {
            Some(frame) => {
                let response = IoPacket::parse(&frame, poll::RSP_GROUP, poll::RSP).map_err(ProtocolError::from)?;
                Some(to_vec_n(&response.data))
            }
            None => None,
        }
    };
    bus.stop_listen().map_err(ProtocolError::Bus)?;
    Ok(result)
}

/// Sends a change-of-state/cyclic update from the master and, unless
/// acknowledgement is suppressed, waits for the slave's acknowledgement.
pub fn cos_write<B: CanBus>(
    bus: &mut B,
    master_addr: u8,
    slave_addr: u8,
    consumed_size: usize,
    produced_size: usize,
    data: &[u8],
    ack_suppress: bool,
    timeout_ms: u32,
) -> Result<Option<Vec<u8, MAX_REASSEMBLY>>, ProtocolError<B::Error>> {
    let command = IoPacket {
        group_id: cos::master::REQ_GROUP,
        message_id: cos::master::REQ,
        src_mac: master_addr,
        dst_mac: slave_addr,
        data: to_vec_n(data),
    };

    let rsp_id = can_addr(cos::slave::RSP_GROUP, cos::slave::RSP, slave_addr).map_err(ProtocolError::from)?;
    bus.start_listen(&[rsp_id]).map_err(ProtocolError::Bus)?;

    send_io_write(bus, &command, consumed_size, data.len())?;

    let result = if !ack_suppress {
        if produced_size > 8 {
            read_fragment_io(bus, timeout_ms)?
        } else {
            match bus.recv(timeout_ms).map_err(ProtocolError::Bus)? {
                Some(frame) => {
                    let response =
                        IoPacket::parse(&frame, cos::slave::RSP_GROUP, cos::slave::RSP).map_err(ProtocolError::from)?;
                    Some(to_vec_n(&response.data))
                }
                None => return Err(ProtocolError::NoResponse),
            }
        }
    } else {
        None
    };

    bus.stop_listen().map_err(ProtocolError::Bus)?;
    Ok(result)
}

/// Receives a change-of-state/cyclic update produced by the slave and,
/// unless acknowledgement is suppressed, sends the master's acknowledgement.
pub fn cos_read<B: CanBus>(
    bus: &mut B,
    master_addr: u8,
    slave_addr: u8,
    consumed_size: usize,
    produced_size: usize,
    ack_data: &[u8],
    ack_suppress: bool,
    timeout_ms: u32,
) -> Result<Option<Vec<u8, MAX_REASSEMBLY>>, ProtocolError<B::Error>> {
    let req_id = can_addr(cos::slave::REQ_GROUP, cos::slave::REQ, slave_addr).map_err(ProtocolError::from)?;
    bus.start_listen(&[req_id]).map_err(ProtocolError::Bus)?;

    let result = if produced_size > 8 {
        read_fragment_io(bus, timeout_ms)?
    } else {
        match bus.recv(timeout_ms).map_err(ProtocolError::Bus)? {
            Some(frame) => {
                let response =
                    IoPacket::parse(&frame, cos::slave::REQ_GROUP, cos::slave::REQ).map_err(ProtocolError::from)?;
                Some(to_vec_n(&response.data))
            }
            None => None,
        }
    };

    if result.is_some() && !ack_suppress {
        let response = IoPacket {
            group_id: cos::master::RSP_GROUP,
            message_id: cos::master::RSP,
            src_mac: master_addr,
            dst_mac: slave_addr,
            data: to_vec_n(ack_data),
        };
        send_io_write(bus, &response, consumed_size, ack_data.len())?;
    }

    bus.stop_listen().map_err(ProtocolError::Bus)?;
    Ok(result)
}

/// Allocates a connection with the given allocation choice.
pub fn allocate<B: CanBus>(
    bus: &mut B,
    cfg: &LinkConfig,
    table: &mut ConnectionTable,
    instance: u8,
    master_addr: u8,
    slave_addr: u8,
    mut alloc_choice: AllocChoice,
    ack_suppress: bool,
    wait_time_ms: u32,
) -> Result<(), ProtocolError<B::Error>> {
    if ack_suppress {
        alloc_choice |= AllocChoice::ACKSUP;
    }

    let data = [alloc_choice.bits(), master_addr];
    service_request(
        bus,
        cfg,
        master_addr,
        slave_addr,
        service::ALLOCATE,
        class::DEVICENET,
        class::DEVICENET_DEFAULT_INSTANCE,
        &data,
        unconnected::REQ_GROUP,
        unconnected::REQ,
        wait_time_ms,
    )?;

    table.record_allocation(instance, alloc_choice);
    Ok(())
}

/// Releases a previously allocated connection.
pub fn release<B: CanBus>(
    bus: &mut B,
    cfg: &LinkConfig,
    table: &mut ConnectionTable,
    instance: u8,
    master_addr: u8,
    slave_addr: u8,
    alloc_choice: AllocChoice,
    wait_time_ms: u32,
) -> Result<(), ProtocolError<B::Error>> {
    let data = [alloc_choice.bits()];
    service_request(
        bus,
        cfg,
        master_addr,
        slave_addr,
        service::RELEASE,
        class::DEVICENET,
        class::DEVICENET_DEFAULT_INSTANCE,
        &data,
        unconnected::REQ_GROUP,
        unconnected::REQ,
        wait_time_ms,
    )?;

    table.record_release(instance, alloc_choice);
    Ok(())
}

/// Probes whether `mac` is free on the network (spec.md §7/E4): broadcasts
/// up to two DupMAC check requests and listens for a response carrying the
/// `response` flag. The DUPMAC-check protocol never retries internally
/// beyond the two probe attempts the spec calls for, and absence of any
/// response is the signal that the MAC is free — this is the one place the
/// link layer's usual "no silent retry" policy (§7) is deliberately
/// overridden, because the protocol's own semantics are defined in terms of
/// two attempts.
pub fn dup_mac_check<B: CanBus>(
    bus: &mut B,
    mac: u8,
    physical_port: u8,
    vendor_id: u16,
    serial_number: u32,
    timeout_ms: u32,
) -> Result<bool, ProtocolError<B::Error>> {
    let probe = DupMacPacket {
        mac,
        response: false,
        physical_port,
        vendor_id,
        serial_number,
    };
    let frame = probe.build().map_err(ProtocolError::from)?;

    let mut guard = ListenGuard::new(bus, &[frame.id]).map_err(ProtocolError::Bus)?;

    let mut mac_in_use = false;
    for _ in 0..2 {
        guard.bus().send(&frame).map_err(ProtocolError::Bus)?;

        if let Some(reply_frame) = guard.bus().recv(timeout_ms).map_err(ProtocolError::Bus)? {
            let reply = DupMacPacket::parse(&reply_frame).map_err(ProtocolError::from)?;
            if reply.response {
                mac_in_use = true;
                break;
            }
        }
    }

    Ok(!mac_in_use)
}

/// `Get_Attribute_All` (0x01) against an explicit connection.
pub fn get_attr_all<B: CanBus>(
    bus: &mut B,
    cfg: &LinkConfig,
    src_addr: u8,
    dst_addr: u8,
    class_id: u8,
    instance_id: u8,
) -> Result<Vec<u8, MAX_REASSEMBLY>, ProtocolError<B::Error>> {
    service_request(
        bus,
        cfg,
        src_addr,
        dst_addr,
        service::GET_ATTR_ALL,
        class_id,
        instance_id,
        &[],
        explicit::REQ_GROUP,
        explicit::REQ,
        cfg.wait_time_ms,
    )
}

/// `Get_Attribute_Single` (0x0E).
pub fn get_attr_single<B: CanBus>(
    bus: &mut B,
    cfg: &LinkConfig,
    src_addr: u8,
    dst_addr: u8,
    class_id: u8,
    instance_id: u8,
    attribute_id: u8,
) -> Result<Vec<u8, MAX_REASSEMBLY>, ProtocolError<B::Error>> {
    service_request(
        bus,
        cfg,
        src_addr,
        dst_addr,
        service::GET_ATTR_SINGLE,
        class_id,
        instance_id,
        &[attribute_id],
        explicit::REQ_GROUP,
        explicit::REQ,
        cfg.wait_time_ms,
    )
}

/// `Set_Attribute_Single` (0x10).
pub fn set_attr_single<B: CanBus>(
    bus: &mut B,
    cfg: &LinkConfig,
    src_addr: u8,
    dst_addr: u8,
    class_id: u8,
    instance_id: u8,
    attribute_id: u8,
    value: &[u8],
) -> Result<Vec<u8, MAX_REASSEMBLY>, ProtocolError<B::Error>> {
    let mut data: Vec<u8, MAX_REASSEMBLY> = Vec::new();
    let _ = data.push(attribute_id);
    for &b in value {
        let _ = data.push(b);
    }
    service_request(
        bus,
        cfg,
        src_addr,
        dst_addr,
        service::SET_ATTR_SINGLE,
        class_id,
        instance_id,
        &data,
        explicit::REQ_GROUP,
        explicit::REQ,
        cfg.wait_time_ms,
    )
}

/// `Reset` (0x05).
pub fn reset<B: CanBus>(
    bus: &mut B,
    cfg: &LinkConfig,
    src_addr: u8,
    dst_addr: u8,
    class_id: u8,
    instance_id: u8,
) -> Result<Vec<u8, MAX_REASSEMBLY>, ProtocolError<B::Error>> {
    service_request(
        bus,
        cfg,
        src_addr,
        dst_addr,
        service::RESET,
        class_id,
        instance_id,
        &[],
        explicit::REQ_GROUP,
        explicit::REQ,
        cfg.wait_time_ms,
    )
}

/// `Get_Member` (0x18): reads one member of a list-type attribute.
pub fn get_member<B: CanBus>(
    bus: &mut B,
    cfg: &LinkConfig,
    src_addr: u8,
    dst_addr: u8,
    class_id: u8,
    instance_id: u8,
    attribute_id: u8,
    member_id: u8,
) -> Result<Vec<u8, MAX_REASSEMBLY>, ProtocolError<B::Error>> {
    service_request(
        bus,
        cfg,
        src_addr,
        dst_addr,
        service::GET_MEMBER,
        class_id,
        instance_id,
        &[attribute_id, member_id],
        explicit::REQ_GROUP,
        explicit::REQ,
        cfg.wait_time_ms,
    )
}

/// `Set_Member` (0x19): writes one member of a list-type attribute.
pub fn set_member<B: CanBus>(
    bus: &mut B,
    cfg: &LinkConfig,
    src_addr: u8,
    dst_addr: u8,
    class_id: u8,
    instance_id: u8,
    attribute_id: u8,
    member_id: u8,
    value: &[u8],
) -> Result<Vec<u8, MAX_REASSEMBLY>, ProtocolError<B::Error>> {
    let mut data: Vec<u8, MAX_REASSEMBLY> = Vec::new();
    let _ = data.push(attribute_id);
    let _ = data.push(member_id);
    for &b in value {
        let _ = data.push(b);
    }
    service_request(
        bus,
        cfg,
        src_addr,
        dst_addr,
        service::SET_MEMBER,
        class_id,
        instance_id,
        &data,
        explicit::REQ_GROUP,
        explicit::REQ,
        cfg.wait_time_ms,
    )
}

/// Sends a cyclic update from the master. Cyclic I/O shares COS's group/
/// message-id pair (spec.md §4.4): both are carried over the same back
/// channel, differing only in what triggers the transfer (elapsed interval
/// vs. a changed value).
pub fn cyclic_write<B: CanBus>(
    bus: &mut B,
    master_addr: u8,
    slave_addr: u8,
    consumed_size: usize,
    produced_size: usize,
    data: &[u8],
    ack_suppress: bool,
    timeout_ms: u32,
) -> Result<Option<Vec<u8, MAX_REASSEMBLY>>, ProtocolError<B::Error>> {
    cos_write(bus, master_addr, slave_addr, consumed_size, produced_size, data, ack_suppress, timeout_ms)
}

/// Receives a cyclic update produced by the slave. See [`cyclic_write`].
pub fn cyclic_read<B: CanBus>(
    bus: &mut B,
    master_addr: u8,
    slave_addr: u8,
    consumed_size: usize,
    produced_size: usize,
    ack_data: &[u8],
    ack_suppress: bool,
    timeout_ms: u32,
) -> Result<Option<Vec<u8, MAX_REASSEMBLY>>, ProtocolError<B::Error>> {
    cos_read(
        bus, master_addr, slave_addr, consumed_size, produced_size, ack_data, ack_suppress, timeout_ms,
    )
}

/// Owns the per-node connection table and the transaction-id bit toggled
/// across outstanding explicit requests, per the design note in spec.md §9
/// ("re-architect as an explicit `Node` structure owning the connection
/// table by value").
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub connections: ConnectionTable,
    next_xid: bool,
}

impl Node {
    pub fn new() -> Self {
        Self {
            connections: ConnectionTable::new(),
            next_xid: false,
        }
    }

    fn take_xid(&mut self) -> bool {
        let xid = self.next_xid;
        self.next_xid = !self.next_xid;
        xid
    }

    /// Sends an explicit service request, toggling the transaction-id bit
    /// for this exchange.
    #[allow(clippy::too_many_arguments)]
    pub fn service_request<B: CanBus>(
        &mut self,
        bus: &mut B,
        cfg: &LinkConfig,
        src_addr: u8,
        dst_addr: u8,
        service_code: u8,
        class_id: u8,
        instance_id: u8,
        data: &[u8],
        group_id: u8,
        message_id: u8,
        wait_time_ms: u32,
    ) -> Result<Vec<u8, MAX_REASSEMBLY>, ProtocolError<B::Error>> {
        let xid = self.take_xid();
        service_request_xid(
            bus, cfg, src_addr, dst_addr, service_code, class_id, instance_id, data, group_id, message_id,
            wait_time_ms, xid,
        )
    }

    /// Allocates a connection and records it in [`Node::connections`].
    #[allow(clippy::too_many_arguments)]
    pub fn allocate<B: CanBus>(
        &mut self,
        bus: &mut B,
        cfg: &LinkConfig,
        instance: u8,
        master_addr: u8,
        slave_addr: u8,
        mut alloc_choice: AllocChoice,
        ack_suppress: bool,
        wait_time_ms: u32,
    ) -> Result<(), ProtocolError<B::Error>> {
        if ack_suppress {
            alloc_choice |= AllocChoice::ACKSUP;
        }

        let data = [alloc_choice.bits(), master_addr];
        self.service_request(
            bus,
            cfg,
            master_addr,
            slave_addr,
            service::ALLOCATE,
            class::DEVICENET,
            class::DEVICENET_DEFAULT_INSTANCE,
            &data,
            unconnected::REQ_GROUP,
            unconnected::REQ,
            wait_time_ms,
        )?;

        self.connections.record_allocation(instance, alloc_choice);
        Ok(())
    }

    /// Releases a previously allocated connection.
    pub fn release<B: CanBus>(
        &mut self,
        bus: &mut B,
        cfg: &LinkConfig,
        instance: u8,
        master_addr: u8,
        slave_addr: u8,
        alloc_choice: AllocChoice,
        wait_time_ms: u32,
    ) -> Result<(), ProtocolError<B::Error>> {
        let data = [alloc_choice.bits()];
        self.service_request(
            bus,
            cfg,
            master_addr,
            slave_addr,
            service::RELEASE,
            class::DEVICENET,
            class::DEVICENET_DEFAULT_INSTANCE,
            &data,
            unconnected::REQ_GROUP,
            unconnected::REQ,
            wait_time_ms,
        )?;

        self.connections.record_release(instance, alloc_choice);
        Ok(())
    }
}
