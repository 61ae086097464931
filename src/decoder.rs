//! Decoding of captured URB events for one target device into output lines
//!
//! A [`Decoder`] holds all state of a capture session and is fed one [`CaptureEvent`] at a time:
//!
//! ```
//! use usbsniff::decoder::{Decoder, Target};
//! use usbsniff::display::Output;
//! use usbsniff::urb::{CaptureEvent, EventType, Timestamp};
//!
//! let mut decoder = Decoder::new(Target::new(1, 4));
//! let event = CaptureEvent {
//!     id: 1,
//!     event_type: EventType::Completion,
//!     transfer_type: 3,
//!     endpoint: 0x81,
//!     device_address: 4,
//!     bus: 1,
//!     setup: None,
//!     data_len: 2,
//!     data: &[0xca, 0xfe],
//!     timestamp: Timestamp::new(10, 0),
//! };
//!
//! let out = decoder.process(&event).unwrap();
//! assert_eq!(out.to_string(), "BULK_IN(0.1): cafe # 0.0000000000000000");
//! ```
use crate::display::{Notice, Output, Record};
use crate::urb::CaptureEvent;
use crate::usb;

pub mod correlator;
pub mod payload;
pub mod timing;

use correlator::{Correlation, Correlator};
use payload::{Payload, MAX_PAYLOAD_SIZE};
use timing::TimestampTracker;

/// Device whose events are decoded; others are dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    /// Bus number
    pub bus: u16,
    /// Device address on the bus
    pub address: u8,
}

impl Target {
    /// New target at `bus` and `address`
    pub fn new(bus: u16, address: u8) -> Self {
        Target { bus, address }
    }

    /// Event belongs to this device; both bus and address must match
    pub fn matches(&self, event: &CaptureEvent) -> bool {
        event.device_address == self.address && event.bus == self.bus
    }
}

/// Counters for a session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DecoderStats {
    /// Events passed to [`Decoder::process`]
    pub received: u64,
    /// Events for other devices
    pub filtered: u64,
    /// Events suppressed as GET_DESCRIPTOR(DEVICE) request or response
    pub suppressed: u64,
    /// Events producing a [`Record`]
    pub records: u64,
}

/// Decoding session for one target device
#[derive(Debug, Clone)]
pub struct Decoder {
    target: Target,
    max_payload_size: usize,
    correlator: Correlator,
    timing: TimestampTracker,
    stats: DecoderStats,
}

impl Decoder {
    /// New session for `target` with the default payload ceiling
    pub fn new(target: Target) -> Self {
        Decoder {
            target,
            max_payload_size: MAX_PAYLOAD_SIZE,
            correlator: Correlator::new(),
            timing: TimestampTracker::new(),
            stats: Default::default(),
        }
    }

    /// Payloads longer than `size` are omitted rather than hex encoded
    pub fn with_max_payload_size(mut self, size: usize) -> Self {
        self.max_payload_size = size;
        self
    }

    /// The device being decoded
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Session counters so far
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Decode the next event of the session
    ///
    /// Returns `None` for events of other devices and zero length payloads. Every event of the target
    /// device advances the relative timestamp, including suppressed ones.
    pub fn process(&mut self, event: &CaptureEvent) -> Option<Output> {
        self.stats.received += 1;
        if !self.target.matches(event) {
            self.stats.filtered += 1;
            return None;
        }

        let delta = self.timing.observe(event.timestamp);

        match self.correlator.process(event) {
            Correlation::Request => {
                self.stats.suppressed += 1;
                return Some(Output::Notice(Notice::DescriptorRequest));
            }
            Correlation::Response => {
                self.stats.suppressed += 1;
                return Some(Output::Notice(Notice::DescriptorResponse));
            }
            Correlation::Forward => (),
        }

        let payload = match payload::encode(
            event.data,
            event.data_len as usize,
            self.max_payload_size,
        ) {
            Payload::Empty => return None,
            Payload::Omitted => return Some(Output::Notice(Notice::PayloadOmitted)),
            Payload::Hex(hex) => hex,
        };

        if event.is_truncated() {
            log::warn!(
                "urb {:#x} captured {} of {} payload bytes; increase snap length",
                event.id,
                event.data.len(),
                event.data_len
            );
        }

        let (transfer_type, direction) = match usb::classify(event.transfer_type, event.endpoint)
        {
            Ok(c) => c,
            Err(e) => {
                log::warn!("urb {:#x}: {:#}", event.id, e);
                return Some(Output::Notice(Notice::UnknownTransferType(
                    event.transfer_type,
                )));
            }
        };

        let setup = match transfer_type {
            usb::TransferType::Control => Some(event.setup.unwrap_or_default()),
            _ => None,
        };

        self.stats.records += 1;
        Some(Output::Record(Record {
            transfer_type,
            direction,
            endpoint: usb::endpoint_number(event.endpoint),
            setup,
            payload,
            delta,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::urb::{EventType, Timestamp};
    use crate::usb::{Direction, SetupPacket, TransferType};

    const GET_DEVICE_DESCRIPTOR: [u8; 8] = [0x80, 0x06, 0x00, 0x01, 0x00, 0x00, 0x12, 0x00];

    fn event<'a>(
        address: u8,
        transfer_type: u8,
        endpoint: u8,
        data: &'a [u8],
        sec: i64,
        usec: i32,
    ) -> CaptureEvent<'a> {
        CaptureEvent {
            id: 0x1000,
            event_type: EventType::Completion,
            transfer_type,
            endpoint,
            device_address: address,
            bus: 2,
            setup: None,
            data_len: data.len() as u32,
            data,
            timestamp: Timestamp::new(sec, usec),
        }
    }

    fn decoder() -> Decoder {
        Decoder::new(Target::new(2, 9))
    }

    #[test]
    fn test_other_device_dropped_without_state_change() {
        let mut d = decoder();
        assert_eq!(d.process(&event(3, 3, 0x81, &[1], 5, 0)), None);
        assert_eq!(d.timing.previous(), None);
        assert_eq!(d.correlator.state(), correlator::CorrelatorState::Idle);
        assert_eq!(d.stats().filtered, 1);
    }

    #[test]
    fn test_same_address_other_bus_dropped() {
        let mut d = decoder();
        let mut e = event(9, 3, 0x81, &[1], 5, 0);
        e.bus = 3;
        assert_eq!(d.process(&e), None);
    }

    #[test]
    fn test_first_record_zero_delta() {
        let mut d = decoder();
        match d.process(&event(9, 1, 0x83, &[0xab], 100, 42)) {
            Some(Output::Record(r)) => {
                assert_eq!(r.delta, 0.0);
                assert_eq!(r.transfer_type, TransferType::Interrupt);
                assert_eq!(r.direction, Direction::In);
                assert_eq!(r.endpoint, 3);
                assert_eq!(r.payload, "ab");
                assert_eq!(r.setup, None);
            }
            o => panic!("Expected record, got {:?}", o),
        }
    }

    #[test]
    fn test_control_in_record() {
        let mut d = decoder();
        let data = [0u8; 10];
        let mut e = event(9, 2, 0x80, &data, 1, 0);
        e.setup = Some(SetupPacket::from_bytes(&[0xc0, 0x01, 0x34, 0x12, 0x00, 0x00, 0x0a, 0x00]));
        let out = d.process(&e).unwrap();
        let line = out.to_string();
        assert!(line.starts_with("CTRL_IN(0.0): c0:01:1234:0000:"));
    }

    #[test]
    fn test_control_completion_without_setup_renders_zero_fields() {
        let mut d = decoder();
        let out = d.process(&event(9, 2, 0x80, &[0x12, 0x01], 1, 0)).unwrap();
        assert!(out.to_string().contains("00:00:0000:0000:1201"));
    }

    #[test]
    fn test_zero_length_no_output_but_advances_time() {
        let mut d = decoder();
        assert_eq!(d.process(&event(9, 3, 0x02, &[], 10, 0)), None);
        match d.process(&event(9, 3, 0x02, &[1], 10, 250_000)) {
            Some(Output::Record(r)) => assert!((r.delta - 0.25).abs() < 1e-12),
            o => panic!("Expected record, got {:?}", o),
        }
    }

    #[test]
    fn test_descriptor_pair_suppressed() {
        let mut d = decoder();
        let mut req = event(9, 2, 0x80, &[], 1, 0);
        req.event_type = EventType::Submission;
        req.setup = Some(SetupPacket::from_bytes(&GET_DEVICE_DESCRIPTOR));
        let resp_data = [0x12u8, 0x01, 0x00, 0x02];
        let resp = event(9, 2, 0x80, &resp_data, 1, 100);

        assert_eq!(d.process(&req), Some(Output::Notice(Notice::DescriptorRequest)));
        assert_eq!(d.process(&resp), Some(Output::Notice(Notice::DescriptorResponse)));
        assert_eq!(d.stats().suppressed, 2);
        assert_eq!(d.stats().records, 0);

        // suppressed events still moved the baseline
        match d.process(&event(9, 3, 0x81, &[7], 1, 400)) {
            Some(Output::Record(r)) => assert!((r.delta - 0.0003).abs() < 1e-12),
            o => panic!("Expected record, got {:?}", o),
        }
    }

    #[test]
    fn test_oversized_payload_omitted() {
        let mut d = decoder().with_max_payload_size(4);
        assert_eq!(
            d.process(&event(9, 3, 0x81, &[0; 5], 1, 0)),
            Some(Output::Notice(Notice::PayloadOmitted))
        );
        assert!(matches!(
            d.process(&event(9, 3, 0x81, &[0; 4], 1, 0)),
            Some(Output::Record(_))
        ));
    }

    #[test]
    fn test_unknown_transfer_type_notice() {
        let mut d = decoder();
        assert_eq!(
            d.process(&event(9, 9, 0x81, &[1, 2], 1, 0)),
            Some(Output::Notice(Notice::UnknownTransferType(9)))
        );
    }
}
