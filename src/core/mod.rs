//! Register file, ALU, control unit, and the five-stage pipeline.

/// Register file, program counter, and status flags.
pub mod arch;

/// The arithmetic/logic unit.
pub mod alu;

/// Opcode table, instruction classification, and decode logic.
pub mod control;

/// Pipeline latches.
pub mod pipeline;

/// Hazard detection and operand forwarding.
pub mod hazards;

/// The five pipeline stages.
pub mod stages;

/// Ties the register file, memory, latches, and stages together into a
/// runnable machine.
pub mod simulator;
