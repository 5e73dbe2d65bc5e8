//! Architectural state: general-purpose registers, program counter, flags.
//!
//! Implements the register file of the simulated machine, containing 32
//! registers (R0-R31). Register R0 is hardwired to zero: the guard lives
//! at the Writeback call site (see `core::stages::write_back`), not in
//! the store itself, matching the pipeline's own write discipline.

/// The four architectural status flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct Flags {
    pub zero: bool,
    pub negative: bool,
    pub carry: bool,
    /// Declared for completeness; never written by the core ALU
    /// operations and always reported as `false`.
    pub overflow: bool,
}

/// General-purpose register file.
///
/// Contains 32 general-purpose registers (R0-R31) plus the program
/// counter and status flags. Register R0 always reads back whatever was
/// last stored in slot 0 -- it is writeback's job to never store there.
pub struct RegisterFile {
    regs: [u32; 32],
    pub pc: u32,
    pub flags: Flags,
}

impl RegisterFile {
    /// Creates a new register file with all registers, PC, and flags
    /// set to zero.
    pub fn new() -> Self {
        Self {
            regs: [0; 32],
            pc: 0,
            flags: Flags::default(),
        }
    }

    /// Reads a register value.
    pub fn read(&self, idx: u8) -> u32 {
        self.regs[idx as usize]
    }

    /// Writes a register value.
    ///
    /// This performs no R0 guard -- callers that implement Writeback
    /// are responsible for skipping index 0 per invariant I2.
    pub fn write(&mut self, idx: u8, val: u32) {
        self.regs[idx as usize] = val;
    }

    /// Updates zero/negative flags from an ALU result. Carry and
    /// overflow are left untouched; the caller sets carry explicitly
    /// for ADD/SUB.
    pub fn update_zn(&mut self, result: u32) {
        self.flags.zero = result == 0;
        self.flags.negative = (result >> 31) & 1 == 1;
    }

    /// Snapshot of all 32 registers, for history recording.
    pub fn snapshot(&self) -> [u32; 32] {
        self.regs
    }

    /// Dumps registers to stdout, two per line.
    pub fn dump(&self) {
        for i in (0..32).step_by(2) {
            println!(
                "R{:<2}={:#010x} R{:<2}={:#010x}",
                i,
                self.regs[i],
                i + 1,
                self.regs[i + 1]
            );
        }
    }
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}
