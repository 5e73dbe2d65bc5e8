use crate::core::control;
use crate::core::pipeline::{IdEx, IdExEntry};
use crate::core::simulator::Simulator;
use crate::history::{Channel, Stage};

/// Decodes IF/ID into ID/EX: reads the two source registers this
/// instruction's class actually needs (see `control::decode`'s
/// `read1`/`read2`), installs control signals, and leaves forwarding to
/// Execute. If a flush is pending (a branch/jump just committed in
/// Execute this cycle) the fetched instruction is discarded unread and
/// ID/EX becomes a bubble instead -- invariant I5.
pub fn decode_stage(sim: &mut Simulator) {
    if sim.flush {
        sim.if_id.entry = None;
        sim.id_ex = IdEx::bubble();
        sim.flush = false;
        return;
    }

    let Some(fetched) = sim.if_id.entry.take() else {
        sim.id_ex = IdEx::bubble();
        return;
    };

    let d = control::decode(fetched.instruction);
    let rv1 = sim.regs.read(d.read1);
    let rv2 = sim.regs.read(d.read2);

    sim.history
        .track_read(Stage::Decode, Channel::Reg(d.read1), rv1);
    sim.history
        .track_read(Stage::Decode, Channel::Reg(d.read2), rv2);

    if sim.trace {
        eprintln!(
            "ID  pc={:#010x} opcode={:#04x} dest={} rv1={:#010x} rv2={:#010x}",
            fetched.pc, d.opcode, d.dest, rv1, rv2
        );
    }

    sim.id_ex = IdEx {
        entry: Some(IdExEntry {
            pc: fetched.pc,
            instruction: fetched.instruction,
            dest: d.dest,
            src1: d.read1,
            src2: d.read2,
            rv1,
            rv2,
            immediate: d.immediate,
            alu_op: d.alu_op,
            ctrl: d.ctrl,
        }),
    };
}
