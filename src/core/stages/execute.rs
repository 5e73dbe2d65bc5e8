use crate::core::alu::Alu;
use crate::core::control::{self, CALL, JMP, RET};
use crate::core::hazards;
use crate::core::pipeline::{ExMem, ExMemEntry};
use crate::core::simulator::Simulator;

/// Executes ID/EX: resolves forwarded operands, runs the ALU, and
/// resolves control flow. A taken branch or unconditional jump
/// overwrites PC here and raises `sim.flush`, which Decode consumes on
/// its turn later this same cycle -- before it can commit the
/// instruction sitting in IF/ID, satisfying invariant I5.
pub fn execute_stage(sim: &mut Simulator) {
    let Some(id_entry) = sim.id_ex.entry else {
        sim.ex_mem = ExMem { entry: None };
        return;
    };

    let (rv1, rv2) = hazards::forward_rs(&id_entry, &sim.ex_mem, &sim.wb_latch);
    let operand2 = if id_entry.ctrl.alu_src {
        id_entry.immediate as u32
    } else {
        rv2
    };

    if matches!(id_entry.alu_op, control::AluOp::Div) && operand2 == 0 {
        sim.history.record_warning(format!(
            "pc={:#010x}: division by zero, result forced to 0",
            id_entry.pc
        ));
        if sim.trace {
            eprintln!("EX  pc={:#010x} division by zero", id_entry.pc);
        }
    }

    let result = Alu::execute(id_entry.alu_op, rv1, operand2);
    sim.regs.update_zn(result.value);
    if let Some(carry) = result.carry {
        sim.regs.flags.carry = carry;
    }

    let opcode = control::decode(id_entry.instruction).opcode;
    let mut alu_result = result.value;

    if id_entry.ctrl.jump {
        let target = match opcode {
            RET => rv1,
            CALL | JMP => id_entry
                .pc
                .wrapping_add(((id_entry.immediate << 2) as i32) as u32),
            _ => id_entry.pc.wrapping_add(4),
        };
        if opcode == CALL {
            alu_result = id_entry.pc.wrapping_add(4);
        }
        sim.regs.pc = target;
        sim.flush = true;
    } else if id_entry.ctrl.branch {
        let taken = match opcode {
            control::BEQ => rv1 == rv2,
            control::BNE => rv1 != rv2,
            control::BLT => rv1 < rv2,
            control::BGE => rv1 >= rv2,
            _ => false,
        };
        if taken {
            let target = id_entry
                .pc
                .wrapping_add(((id_entry.immediate << 2) as i32) as u32);
            sim.regs.pc = target;
            sim.flush = true;
        }
    }

    if sim.trace {
        eprintln!(
            "EX  pc={:#010x} alu_result={:#010x}",
            id_entry.pc, alu_result
        );
    }

    sim.ex_mem = ExMem {
        entry: Some(ExMemEntry {
            pc: id_entry.pc,
            instruction: id_entry.instruction,
            dest: id_entry.dest,
            alu_result,
            store_data: rv2,
            ctrl: id_entry.ctrl,
        }),
    };
}
