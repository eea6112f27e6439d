//! Runner for the Klaus Dormann functional suite: a raw 64 KiB image over a
//! flat memory map, executed until the program parks itself in a self-loop.
//!
//! Credit: Klaus Dormann — https://github.com/Klaus2m5/6502_65C02_functional_tests

use std::cell::Cell;
use std::fs;
use std::rc::Rc;

use anyhow::{bail, ensure, Context, Result};
use braeburn_mos6502::{disassemble, Bus, BusResponse, RamBus64kb, MOS6502};
use colored::Colorize;
use log::{debug, info};

use crate::Args;

/// The suite's documented entry point.
const START_PC: u16 = 0x0400;

pub fn run(args: &Args) -> Result<usize> {
    let image = fs::read(&args.testfile)
        .with_context(|| format!("reading {}", args.testfile.display()))?;
    ensure!(
        image.len() == RamBus64kb::SIZE,
        "expected a raw 64 KiB image, got {} bytes",
        image.len()
    );

    let mut bus = RamBus64kb::new().with_memory_at(0x0000, &image);
    let mut cpu = MOS6502::new();
    cpu.registers_mut().pc = START_PC;

    // The suite signals both success and failure by branching to itself; the
    // trap hook tells us where it parked.
    let trap: Rc<Cell<Option<u16>>> = Rc::new(Cell::new(None));
    let hook = trap.clone();
    cpu.set_trap_handler(move |pc| hook.set(Some(pc)));

    info!(
        "running {} from {:#06x}, success trap {:#06x}",
        args.testfile.display(),
        START_PC,
        args.success_trap
    );

    let mut response = BusResponse::default();
    let trapped = loop {
        let request = cpu.tick(response)?;
        response = bus.respond(&request);

        if let Some(pc) = trap.get() {
            break pc;
        }
        if cpu.ticks() >= args.max_cycles {
            bail!(
                "no trap after {} cycles; PC at {:#06x}",
                cpu.ticks(),
                cpu.registers().pc
            );
        }
        if args.verbose && request.is_sync() {
            debug!("fetch {:#06x}", request.address);
        }
    };

    info!("trapped at {:#06x} after {} cycles", trapped, cpu.ticks());

    if trapped == args.success_trap {
        println!(
            "{} reached the success trap at {:#06x}",
            "PASS".green().bold(),
            trapped
        );
        Ok(0)
    } else {
        let bytes = [
            bus.read_u8(trapped),
            bus.read_u8(trapped.wrapping_add(1)),
            bus.read_u8(trapped.wrapping_add(2)),
        ];
        println!(
            "{} trapped at {:#06x}: {}",
            "FAIL".red().bold(),
            trapped,
            disassemble(bytes, trapped)
        );
        Ok(1)
    }
}
