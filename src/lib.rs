
#![no_std]

#[cfg(test)]
extern crate std;

pub mod error;

pub mod convert;

pub mod definitions;

pub mod addressing;

pub mod packet;

pub mod frag;

pub mod cip;

pub mod link;

pub mod can;

/// Configuration for the link layer.
#[derive(Clone, PartialEq, Debug)]
pub struct LinkConfig {
    /// Maximum time to wait for an explicit response, in milliseconds.
    pub wait_time_ms: u32,

    /// Timeout for an explicit fragment acknowledgement, in milliseconds.
    pub fragment_ack_timeout_ms: u32,

    /// Sample rate used when polling for I/O responses, in milliseconds.
    pub poll_sample_rate_ms: u32,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            wait_time_ms: 1000,
            fragment_ack_timeout_ms: 1000,
            poll_sample_rate_ms: 20,
        }
    }
}

/// CAN bus interface used by the link layer.
pub use crate::can::CanBus;
