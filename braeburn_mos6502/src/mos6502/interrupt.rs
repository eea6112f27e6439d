//! Reset, IRQ and NMI entry sequences.
//!
//! Each sequence is a pseudo-instruction: a step list the pump runs in place
//! of an opcode fetch. They are not in the decode table, so they may exceed
//! the table's seven-step cap.

use super::bus::{BusRequest, BusResponse};
use super::microcode::{Microcode, MicrocodeResponse};
use super::state::State;
use super::status::StatusFlag;

pub const NMI_VECTOR_ADDRESS: u16 = 0xFFFA;
pub const RESET_VECTOR_ADDRESS: u16 = 0xFFFC;
pub const IRQ_VECTOR_ADDRESS: u16 = 0xFFFE;

/// The documented 7-cycle reset: two reads at PC, three stack accesses with
/// the writes suppressed (SP still walks down, which is how a zeroed SP ends
/// up at `0xFD`), then the vector.
pub(crate) static RESET_SEQUENCE: [Option<Microcode>; 8] = [
    Some(interrupt_dummy),
    Some(interrupt_dummy),
    Some(reset_stack),
    Some(reset_stack),
    Some(reset_stack),
    Some(reset_vector_low),
    Some(reset_vector_high),
    Some(interrupt_jump),
];

/// The hardware-interrupt frame: like BRK but without consuming a padding
/// byte and with `B` clear in the pushed status.
pub(crate) static IRQ_SEQUENCE: [Option<Microcode>; 8] = [
    Some(interrupt_dummy),
    Some(interrupt_dummy),
    Some(interrupt_push_pch),
    Some(interrupt_push_pcl),
    Some(interrupt_push_status),
    Some(irq_vector_low),
    Some(irq_vector_high),
    Some(interrupt_jump),
];

pub(crate) static NMI_SEQUENCE: [Option<Microcode>; 8] = [
    Some(interrupt_dummy),
    Some(interrupt_dummy),
    Some(interrupt_push_pch),
    Some(interrupt_push_pcl),
    Some(interrupt_push_status),
    Some(nmi_vector_low),
    Some(nmi_vector_high),
    Some(interrupt_jump),
];

fn interrupt_dummy(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    MicrocodeResponse::request(BusRequest::read(state.registers.pc))
}

fn reset_stack(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::read(state.stack_address());
    state.registers.sp = state.registers.sp.wrapping_sub(1);
    MicrocodeResponse::request(request)
}

fn reset_vector_low(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.set_flag(StatusFlag::InterruptDisable, true);
    MicrocodeResponse::request(BusRequest::read(RESET_VECTOR_ADDRESS))
}

fn reset_vector_high(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    MicrocodeResponse::request(BusRequest::read(RESET_VECTOR_ADDRESS.wrapping_add(1)))
}

fn interrupt_push_pch(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::write(state.stack_address(), (state.registers.pc >> 8) as u8);
    state.registers.sp = state.registers.sp.wrapping_sub(1);
    MicrocodeResponse::request(request)
}

fn interrupt_push_pcl(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let request = BusRequest::write(state.stack_address(), (state.registers.pc & 0xFF) as u8);
    state.registers.sp = state.registers.sp.wrapping_sub(1);
    MicrocodeResponse::request(request)
}

fn interrupt_push_status(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    let pushed = state
        .registers
        .p
        .with(StatusFlag::Break, false)
        .with(StatusFlag::Unused, true)
        .0;
    let request = BusRequest::write(state.stack_address(), pushed);
    state.registers.sp = state.registers.sp.wrapping_sub(1);
    MicrocodeResponse::request(request)
}

fn irq_vector_low(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.set_flag(StatusFlag::InterruptDisable, true);
    MicrocodeResponse::request(BusRequest::read(IRQ_VECTOR_ADDRESS))
}

fn irq_vector_high(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    MicrocodeResponse::request(BusRequest::read(IRQ_VECTOR_ADDRESS.wrapping_add(1)))
}

fn nmi_vector_low(state: &mut State, _response: BusResponse) -> MicrocodeResponse {
    state.set_flag(StatusFlag::InterruptDisable, true);
    MicrocodeResponse::request(BusRequest::read(NMI_VECTOR_ADDRESS))
}

fn nmi_vector_high(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.lo = response.data;
    MicrocodeResponse::request(BusRequest::read(NMI_VECTOR_ADDRESS.wrapping_add(1)))
}

fn interrupt_jump(state: &mut State, response: BusResponse) -> MicrocodeResponse {
    state.registers.pc = u16::from_le_bytes([state.lo, response.data]);
    MicrocodeResponse::complete()
}
