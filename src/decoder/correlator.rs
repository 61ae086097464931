//! Pairs the device GET_DESCRIPTOR request issued when a capture starts with its response so both can be
//! replaced by a marker line.
//!
//! Matching trusts ordering alone: whichever event follows the request is taken as its response, whether or
//! not the URB id agrees. An unrelated event arriving in between is consumed as the response.
use crate::urb::CaptureEvent;

/// Correlator state
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CorrelatorState {
    /// No request pending
    #[default]
    Idle,
    /// GET_DESCRIPTOR(DEVICE) with this URB id is outstanding
    AwaitingResponse(u64),
}

/// What the correlator decided for an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    /// Event is the GET_DESCRIPTOR(DEVICE) request; suppress it
    Request,
    /// Event is taken as the response to the pending request; suppress it
    Response,
    /// Not part of a descriptor exchange; format normally
    Forward,
}

/// Two state machine recognising GET_DESCRIPTOR(DEVICE) request/response pairs
#[derive(Debug, Default, Clone)]
pub struct Correlator {
    state: CorrelatorState,
}

impl Correlator {
    /// New correlator in [`CorrelatorState::Idle`]
    pub fn new() -> Self {
        Default::default()
    }

    /// Current state
    pub fn state(&self) -> CorrelatorState {
        self.state
    }

    /// Advance with the next event of the session
    pub fn process(&mut self, event: &CaptureEvent) -> Correlation {
        match self.state {
            CorrelatorState::Idle => {
                if event
                    .setup
                    .is_some_and(|setup| setup.is_device_get_descriptor())
                {
                    log::debug!("GET_DESCRIPTOR(DEVICE) request urb {:#x}", event.id);
                    self.state = CorrelatorState::AwaitingResponse(event.id);
                    Correlation::Request
                } else {
                    Correlation::Forward
                }
            }
            CorrelatorState::AwaitingResponse(id) => {
                if id != event.id {
                    log::debug!(
                        "Taking urb {:#x} as response to GET_DESCRIPTOR(DEVICE) urb {:#x}",
                        event.id,
                        id
                    );
                }
                self.state = CorrelatorState::Idle;
                Correlation::Response
            }
        }
    }
}
