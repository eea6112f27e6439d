use super::bus::{BusRequest, BusResponse};
use super::state::State;

/// A single-cycle microcode step: a pure function of CPU state and the
/// previous cycle's data byte, producing this cycle's bus request.
pub(crate) type Microcode = fn(&mut State, BusResponse) -> MicrocodeResponse;

/// What a microcode step hands back to the pump.
///
/// - `request` present: the bus transaction for this tick.
/// - `request` and `injection` both absent: the instruction is complete and
///   the pump issues the next opcode fetch on this same tick.
/// - `injection` present: that step runs on the next tick, ahead of the
///   instruction's remaining step list, delaying it by exactly one cycle.
#[derive(Clone, Copy, Default)]
pub(crate) struct MicrocodeResponse {
    pub request: Option<BusRequest>,
    pub injection: Option<Microcode>,
}

impl MicrocodeResponse {
    /// The instruction is done; no transaction of its own this tick.
    pub fn complete() -> MicrocodeResponse {
        MicrocodeResponse::default()
    }

    pub fn request(request: BusRequest) -> MicrocodeResponse {
        MicrocodeResponse {
            request: Some(request),
            injection: None,
        }
    }

    /// Issue `request` this tick and schedule `injection` for the next one.
    pub fn inject(request: BusRequest, injection: Microcode) -> MicrocodeResponse {
        MicrocodeResponse {
            request: Some(request),
            injection: Some(injection),
        }
    }
}
