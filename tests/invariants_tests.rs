//! Integration tests for the pipeline's documented invariants (I1-I5).

use pipesim::Simulator;

/// I1: PC is always 4-byte aligned on fetch.
#[test]
fn pc_stays_word_aligned_across_a_run_with_branches() {
    let words = Simulator::assemble(
        "MOVI R1, #1\nMOVI R2, #1\nBEQ R1, R2, skip\nMOVI R3, #9\nskip: CALL sub\nHALT\nsub: RET\n",
    )
    .unwrap();
    let mut sim = Simulator::new();
    sim.load_program(&words, 0).unwrap();
    for _ in 0..40 {
        if !sim.step() {
            break;
        }
        assert_eq!(sim.regs.pc % 4, 0, "pc {:#x} is not word aligned", sim.regs.pc);
    }
}

/// I2: register 0 always reads back as 0, regardless of what targets
/// it during a run.
#[test]
fn register_zero_never_retains_a_write() {
    let words = Simulator::assemble("MOVI R0, #55\nADD R0, R0, R0\nHALT\n").unwrap();
    let mut sim = Simulator::new();
    sim.load_program(&words, 0).unwrap();
    sim.run(1000);
    assert_eq!(sim.regs.read(0), 0);
}

/// I3: exactly one history record is appended per cycle, with strictly
/// monotonic cycle numbers.
#[test]
fn history_has_exactly_one_record_per_cycle() {
    let words = Simulator::assemble("MOVI R1, #1\nMOVI R2, #2\nADD R3, R1, R2\nHALT\n").unwrap();
    let mut sim = Simulator::new();
    sim.load_program(&words, 0).unwrap();
    let summary = sim.run(1000);
    assert_eq!(sim.history.len() as u64, summary.cycles);
    for n in 0..summary.cycles {
        assert!(sim.history.get_cycle(n).is_some(), "missing cycle {}", n);
    }
}

/// I4: instructions committed never exceeds instructions fetched.
#[test]
fn committed_count_never_exceeds_fetched_count() {
    let words = Simulator::assemble(
        "MOVI R1, #1\nMOVI R2, #1\nBEQ R1, R2, skip\nMOVI R3, #9\nskip: MOVI R4, #2\nHALT\n",
    )
    .unwrap();
    let mut sim = Simulator::new();
    sim.load_program(&words, 0).unwrap();
    let summary = sim.run(1000);

    let mut fetched = 0u64;
    for n in 0..summary.cycles {
        let (_, events) = sim.history.get_cycle(n).unwrap();
        if events
            .iter()
            .any(|(stage, channel, _)| *stage == pipesim::history::Stage::Fetch && *channel == pipesim::history::Channel::PC)
        {
            fetched += 1;
        }
    }
    assert!(summary.instructions_committed <= fetched);
}

/// I5: the instruction sitting in IF/ID at the moment a branch is taken
/// in Execute never reaches Writeback -- the flushed MOVI R3 #9 inside
/// the not-taken arm must never execute.
#[test]
fn flushed_instruction_never_commits_architectural_effect() {
    let words = Simulator::assemble(
        "MOVI R1, #1\nMOVI R2, #1\nBEQ R1, R2, skip\nMOVI R3, #9\nskip: MOVI R4, #2\nHALT\n",
    )
    .unwrap();
    let mut sim = Simulator::new();
    sim.load_program(&words, 0).unwrap();
    sim.run(1000);
    assert_eq!(sim.regs.read(3), 0, "flushed instruction must not commit");
    assert_eq!(sim.regs.read(4), 2);
}
