use crate::core::simulator::Simulator;
use crate::history::{Channel, Stage};

/// Executes MEM/WB: writes the destination register (skipping index 0
/// per invariant I2) and retires the instruction. Every non-bubble
/// entry that reaches here counts toward `instructions_committed`,
/// including HALT itself -- HALT must retire before the machine stops,
/// per §4.5's termination rule.
pub fn wb_stage(sim: &mut Simulator) {
    let Some(wb) = sim.mem_wb.entry else {
        return;
    };

    if wb.ctrl.reg_write && wb.dest != 0 {
        let val = if wb.ctrl.mem_to_reg {
            wb.mem_data
        } else {
            wb.alu_result
        };
        sim.regs.write(wb.dest, val);
        sim.history
            .track_write(Stage::Writeback, Channel::Reg(wb.dest), val);
    }

    sim.stats.instructions_committed += 1;

    if sim.trace {
        eprintln!("WB  pc={:#010x} dest={} retired", wb.pc, wb.dest);
    }

    if wb.ctrl.is_halt {
        sim.halted = true;
    }
}
