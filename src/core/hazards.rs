//! Hazard detection and operand forwarding.
//!
//! Forwarding is performed EX-side, matching the teacher's placement of
//! `forward_rs` inside `execute_stage` rather than inside Decode.
//! `forward_rs` takes `mem_wb` by reference but the caller must pass the
//! `wb_latch` snapshot taken right after `wb_stage`, not the live
//! `mem_wb` field -- by the time `execute_stage` runs this cycle,
//! `mem_stage` has already overwritten `mem_wb` with the next retiring
//! instruction.

use crate::core::control::{self, AluOp};
use crate::core::pipeline::{ExMem, IfId, IdEx, MemWb};

/// True if the instruction in ID/EX is a load whose destination is
/// read by the instruction currently sitting in IF/ID (not yet
/// decoded) -- the classic one-cycle load-use stall.
pub fn need_stall_load_use(id_ex: &IdEx, if_id: &IfId) -> bool {
    let Some(ex_inst) = id_ex.entry else {
        return false;
    };
    if !ex_inst.ctrl.mem_read || ex_inst.dest == 0 {
        return false;
    }
    let Some(fetched) = if_id.entry else {
        return false;
    };
    let d = control::decode(fetched.instruction);
    d.read1 == ex_inst.dest || d.read2 == ex_inst.dest
}

/// Conservative safety stall: a MUL result sitting in EX/MEM, followed
/// by a DIV in ID/EX reading the same register. Not strictly necessary
/// with full forwarding; kept because the source enforces it.
pub fn need_stall_mul_div(id_ex: &IdEx, ex_mem: &ExMem) -> bool {
    let Some(mem_inst) = ex_mem.entry else {
        return false;
    };
    if mem_inst.ctrl.is_halt {
        return false;
    }
    let Some(ex_inst) = id_ex.entry else {
        return false;
    };
    if ex_inst.alu_op != AluOp::Div {
        return false;
    }
    mem_inst.dest != 0
        && control::decode(mem_inst.instruction).alu_op == AluOp::Mul
        && (ex_inst.src1 == mem_inst.dest || ex_inst.src2 == mem_inst.dest)
}

/// Resolves the values of `rs1`/`rs2` for the instruction currently in
/// ID/EX, substituting in-flight results from EX/MEM or MEM/WB ahead of
/// the register file read. EX/MEM takes priority over MEM/WB; a load's
/// forwarded value comes from `mem_data`, any other instruction's from
/// `alu_result`.
pub fn forward_rs(id_entry: &crate::core::pipeline::IdExEntry, ex_mem: &ExMem, mem_wb: &MemWb) -> (u32, u32) {
    let mut rv1 = id_entry.rv1;
    let mut rv2 = id_entry.rv2;

    let forward_value = |dest: u8, ctrl: &control::ControlSignals, alu: u32, mem: u32| -> Option<u32> {
        if !ctrl.reg_write || dest == 0 {
            return None;
        }
        Some(if ctrl.mem_to_reg { mem } else { alu })
    };

    if let Some(wb) = mem_wb.entry {
        if let Some(v) = forward_value(wb.dest, &wb.ctrl, wb.alu_result, wb.mem_data) {
            if id_entry.src1 == wb.dest {
                rv1 = v;
            }
            if id_entry.src2 == wb.dest {
                rv2 = v;
            }
        }
    }

    if let Some(ex) = ex_mem.entry {
        if let Some(v) = forward_value(ex.dest, &ex.ctrl, ex.alu_result, ex.alu_result) {
            if id_entry.src1 == ex.dest {
                rv1 = v;
            }
            if id_entry.src2 == ex.dest {
                rv2 = v;
            }
        }
    }

    (rv1, rv2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::control::ControlSignals;
    use crate::core::pipeline::{ExMemEntry, IdExEntry, MemWbEntry};

    fn id_ex_load(dest: u8) -> IdEx {
        IdEx {
            entry: Some(IdExEntry {
                pc: 0,
                instruction: 0,
                dest,
                src1: 0,
                src2: 0,
                rv1: 0,
                rv2: 0,
                immediate: 0,
                alu_op: AluOp::Add,
                ctrl: ControlSignals {
                    mem_read: true,
                    reg_write: true,
                    ..Default::default()
                },
            }),
        }
    }

    fn if_id_reading(reg: u8) -> IfId {
        use crate::core::control::ADD;
        let word = (ADD as u32) << 24 | 9u32 << 16 | (reg as u32) << 8;
        IfId {
            entry: Some(crate::core::pipeline::IfIdEntry {
                pc: 0,
                instruction: word,
            }),
        }
    }

    #[test]
    fn detects_load_use_hazard() {
        let id_ex = id_ex_load(3);
        let if_id = if_id_reading(3);
        assert!(need_stall_load_use(&id_ex, &if_id));
    }

    #[test]
    fn no_stall_when_registers_differ() {
        let id_ex = id_ex_load(3);
        let if_id = if_id_reading(4);
        assert!(!need_stall_load_use(&id_ex, &if_id));
    }

    #[test]
    fn ex_mem_forwarding_takes_priority_over_mem_wb() {
        let id_entry = IdExEntry {
            pc: 0,
            instruction: 0,
            dest: 9,
            src1: 1,
            src2: 2,
            rv1: 0,
            rv2: 0,
            immediate: 0,
            alu_op: AluOp::Add,
            ctrl: ControlSignals::default(),
        };
        let ex_mem = ExMem {
            entry: Some(ExMemEntry {
                pc: 0,
                instruction: 0,
                dest: 1,
                alu_result: 100,
                store_data: 0,
                ctrl: ControlSignals {
                    reg_write: true,
                    ..Default::default()
                },
            }),
        };
        let mem_wb = MemWb {
            entry: Some(MemWbEntry {
                pc: 0,
                instruction: 0,
                dest: 1,
                alu_result: 200,
                mem_data: 0,
                ctrl: ControlSignals {
                    reg_write: true,
                    ..Default::default()
                },
            }),
        };
        let (rv1, _) = forward_rs(&id_entry, &ex_mem, &mem_wb);
        assert_eq!(rv1, 100);
    }
}
