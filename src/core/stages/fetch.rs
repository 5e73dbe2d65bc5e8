use crate::core::simulator::Simulator;
use crate::core::pipeline::IfIdEntry;
use crate::history::{Channel, Stage};

/// Fetches one instruction word at `pc` into IF/ID and advances `pc` by
/// four. Does nothing if IF/ID is already occupied (a stall or flush
/// left it full) or the machine has halted.
pub fn fetch_stage(sim: &mut Simulator) {
    if sim.halted || sim.if_id.entry.is_some() {
        return;
    }

    let pc = sim.regs.pc;
    let instruction = match sim.memory.read_word(pc) {
        Ok(word) => word,
        Err(err) => {
            sim.fault = Some(err);
            sim.halted = true;
            return;
        }
    };

    if sim.trace {
        eprintln!("IF  pc={:#010x} inst={:#010x}", pc, instruction);
    }

    sim.history.track_read(Stage::Fetch, Channel::PC, pc);
    sim.if_id.entry = Some(IfIdEntry { pc, instruction });
    sim.regs.pc = pc.wrapping_add(4);
}
