use crate::common::SimError;
use crate::core::pipeline::{MemWb, MemWbEntry};
use crate::core::simulator::Simulator;
use crate::history::{Channel, Stage};
use crate::memory::IO_BASE;

/// Executes EX/MEM: performs the load or store, if any, and forwards
/// everything else through to MEM/WB untouched. AlignmentError and
/// AddressError are fatal (§7) and halt the machine; UnknownIoAddress
/// is warning-only -- a read returns 0 and a write is dropped.
pub fn mem_stage(sim: &mut Simulator) {
    let Some(ex) = sim.ex_mem.entry else {
        sim.mem_wb = MemWb { entry: None };
        return;
    };

    let mut mem_data = 0u32;
    let addr = if ex.ctrl.is_io {
        IO_BASE.wrapping_add(ex.alu_result)
    } else {
        ex.alu_result
    };

    if ex.ctrl.mem_read {
        match sim.memory.read_word(addr) {
            Ok(word) => {
                mem_data = word;
                sim.history.track_read(Stage::Memory, Channel::MEM, word);
                if sim.trace {
                    eprintln!(
                        "MEM pc={:#010x} load addr={:#010x} val={:#010x}",
                        ex.pc, addr, word
                    );
                }
            }
            Err(SimError::UnknownIoAddress { .. }) => {}
            Err(err) => {
                sim.fault = Some(err);
                sim.halted = true;
            }
        }
    } else if ex.ctrl.mem_write {
        match sim.memory.write_word(addr, ex.store_data) {
            Ok(()) => {
                sim.history
                    .track_write(Stage::Memory, Channel::MEM, ex.store_data);
                if sim.trace {
                    eprintln!(
                        "MEM pc={:#010x} store addr={:#010x} val={:#010x}",
                        ex.pc, addr, ex.store_data
                    );
                }
            }
            Err(SimError::UnknownIoAddress { .. }) => {}
            Err(err) => {
                sim.fault = Some(err);
                sim.halted = true;
            }
        }
    }

    sim.mem_wb = MemWb {
        entry: Some(MemWbEntry {
            pc: ex.pc,
            instruction: ex.instruction,
            dest: ex.dest,
            alu_result: ex.alu_result,
            mem_data,
            ctrl: ex.ctrl,
        }),
    };
}
