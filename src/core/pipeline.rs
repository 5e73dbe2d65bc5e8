//! Pipeline latches.
//!
//! The source modelled latches as string-keyed maps; here each latch is
//! a fixed-field struct, since their shapes are known statically. Each
//! latch wrapper is `Option`-shaped: `None` is a bubble.

use crate::core::control::{AluOp, ControlSignals};
use serde::Serialize;

/// IF/ID latch contents.
#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct IfIdEntry {
    pub pc: u32,
    pub instruction: u32,
}

/// ID/EX latch contents.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct IdExEntry {
    pub pc: u32,
    pub instruction: u32,
    pub dest: u8,
    pub src1: u8,
    pub src2: u8,
    pub rv1: u32,
    pub rv2: u32,
    pub immediate: i32,
    pub alu_op: AluOp,
    pub ctrl: ControlSignals,
}

/// EX/MEM latch contents.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ExMemEntry {
    pub pc: u32,
    pub instruction: u32,
    pub dest: u8,
    pub alu_result: u32,
    pub store_data: u32,
    pub ctrl: ControlSignals,
}

/// MEM/WB latch contents.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct MemWbEntry {
    pub pc: u32,
    pub instruction: u32,
    pub dest: u8,
    pub alu_result: u32,
    pub mem_data: u32,
    pub ctrl: ControlSignals,
}

/// A double-buffered pipeline latch: `None` when empty (bubble).
#[derive(Clone, Copy, Debug, Default)]
pub struct IfId {
    pub entry: Option<IfIdEntry>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct IdEx {
    pub entry: Option<IdExEntry>,
}

impl IdEx {
    pub fn bubble() -> Self {
        Self { entry: None }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ExMem {
    pub entry: Option<ExMemEntry>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MemWb {
    pub entry: Option<MemWbEntry>,
}
