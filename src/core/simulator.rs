//! Ties the register file, memory, pipeline latches, history recorder,
//! and statistics together into a runnable machine.

use crate::assembler::{self, AssembleError};
use crate::common::SimError;
use crate::core::arch::RegisterFile;
use crate::core::pipeline::{ExMem, IdEx, IfId, MemWb};
use crate::core::stages::{decode_stage, execute_stage, fetch_stage, mem_stage, wb_stage};
use crate::history::HistoryRecorder;
use crate::memory::Memory;
use crate::stats::SimStats;

/// The result of a completed `run`.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    pub cycles: u64,
    pub instructions_committed: u64,
    pub stall_cycles: u64,
    pub ipc: f64,
}

/// The five-stage pipelined machine: register file, memory, the four
/// inter-stage latches, and the observers (history, stats) riding
/// alongside it.
pub struct Simulator {
    pub regs: RegisterFile,
    pub memory: Memory,
    pub if_id: IfId,
    pub id_ex: IdEx,
    pub ex_mem: ExMem,
    pub mem_wb: MemWb,
    pub wb_latch: MemWb,
    pub history: HistoryRecorder,
    pub stats: SimStats,
    pub halted: bool,
    pub flush: bool,
    pub trace: bool,
    pub fault: Option<SimError>,
    cycle: u64,
}

impl Simulator {
    pub fn new() -> Self {
        Self {
            regs: RegisterFile::new(),
            memory: Memory::new(),
            if_id: IfId::default(),
            id_ex: IdEx::default(),
            ex_mem: ExMem::default(),
            mem_wb: MemWb::default(),
            wb_latch: MemWb::default(),
            history: HistoryRecorder::new(),
            stats: SimStats::new(),
            halted: false,
            flush: false,
            trace: false,
            fault: None,
            cycle: 0,
        }
    }

    pub fn assemble(text: &str) -> Result<Vec<u32>, Vec<AssembleError>> {
        assembler::assemble(text)
    }

    pub fn disassemble(word: u32) -> String {
        assembler::disassemble(word)
    }

    pub fn load_program(&mut self, words: &[u32], base: u32) -> Result<(), SimError> {
        self.memory.load_program(words, base)
    }

    /// Runs exactly one pipeline clock. Stages fire in reverse order
    /// (WB, MEM, EX, then a hazard check gates Decode, then Fetch) so
    /// that every stage reads the previous cycle's state of its input
    /// latch before this cycle's writers can overwrite it. `wb_latch` is
    /// snapshotted from `mem_wb` right after `wb_stage` and before
    /// `mem_stage` runs, so Execute can still forward from the
    /// instruction that retired this cycle after `mem_stage` has already
    /// overwritten `mem_wb` with the next one. Returns `false` once the
    /// machine has halted (nothing more to run).
    pub fn step(&mut self) -> bool {
        if self.halted {
            return false;
        }

        self.history.start_cycle(
            self.cycle,
            self.regs.pc,
            self.regs.snapshot(),
            self.regs.flags,
            self.if_id.entry,
            self.id_ex.entry,
            self.ex_mem.entry,
            self.mem_wb.entry,
        );

        wb_stage(self);
        self.wb_latch = self.mem_wb;
        mem_stage(self);
        execute_stage(self);

        let stall = !self.halted
            && (crate::core::hazards::need_stall_load_use(&self.id_ex, &self.if_id)
                || crate::core::hazards::need_stall_mul_div(&self.id_ex, &self.ex_mem));

        if stall {
            self.id_ex = IdEx::bubble();
            self.stats.stall_cycles += 1;
        } else {
            decode_stage(self);
            if self.if_id.entry.is_none() {
                fetch_stage(self);
            }
        }

        self.stats.cycles += 1;
        self.cycle += 1;

        !self.halted
    }

    /// Runs up to `max_cycles` cycles, stopping early if the machine
    /// halts.
    pub fn run(&mut self, max_cycles: u64) -> RunSummary {
        let mut ran = 0u64;
        while ran < max_cycles && self.step() {
            ran += 1;
        }
        RunSummary {
            cycles: self.stats.cycles,
            instructions_committed: self.stats.instructions_committed,
            stall_cycles: self.stats.stall_cycles,
            ipc: self.stats.ipc(),
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assemble_ok(text: &str) -> Vec<u32> {
        Simulator::assemble(text).expect("assembly should succeed")
    }

    #[test]
    fn scenario_a_pure_data_processing() {
        let words = assemble_ok(
            "MOVI R1, #7\nMOVI R2, #5\nADD R3, R1, R2\nHALT\n",
        );
        let mut sim = Simulator::new();
        sim.load_program(&words, 0).unwrap();
        sim.run(1000);
        assert_eq!(sim.regs.read(1), 7);
        assert_eq!(sim.regs.read(2), 5);
        assert_eq!(sim.regs.read(3), 12);
        assert!(!sim.regs.flags.zero);
        assert_eq!(sim.stats.instructions_committed, 4);
    }

    #[test]
    fn scenario_b_load_store_round_trip() {
        let words = assemble_ok(
            "MOVI R1, #42\nSTORE R1, [R0 + 16]\nLOAD R2, [R0 + 16]\nHALT\n",
        );
        let mut sim = Simulator::new();
        sim.load_program(&words, 0).unwrap();
        sim.run(1000);
        assert_eq!(sim.regs.read(2), 42);
        assert_eq!(sim.memory.read_word(16).unwrap(), 42);
    }

    #[test]
    fn scenario_c_load_use_hazard_stalls() {
        let words = assemble_ok(
            "MOVI R1, #8\nSTORE R1, [R0 + 32]\nLOAD R2, [R0 + 32]\nADD R3, R2, R1\nHALT\n",
        );
        let mut sim = Simulator::new();
        sim.load_program(&words, 0).unwrap();
        sim.run(1000);
        assert_eq!(sim.regs.read(3), 16);
        assert!(sim.stats.stall_cycles >= 1);
    }

    #[test]
    fn scenario_d_forwarding_without_stall() {
        let words = assemble_ok(
            "MOVI R1, #3\nADDI R2, R1, #4\nADDI R3, R2, #5\nHALT\n",
        );
        let mut sim = Simulator::new();
        sim.load_program(&words, 0).unwrap();
        sim.run(1000);
        assert_eq!(sim.regs.read(1), 3);
        assert_eq!(sim.regs.read(2), 7);
        assert_eq!(sim.regs.read(3), 12);
        assert_eq!(sim.stats.stall_cycles, 0);
    }

    #[test]
    fn scenario_e_conditional_branch_taken() {
        let words = assemble_ok(
            "MOVI R1, #1\nMOVI R2, #1\nBEQ R1, R2, skip\nMOVI R3, #99\nskip: MOVI R4, #7\nHALT\n",
        );
        let mut sim = Simulator::new();
        sim.load_program(&words, 0).unwrap();
        sim.run(1000);
        assert_eq!(sim.regs.read(3), 0);
        assert_eq!(sim.regs.read(4), 7);
    }

    #[test]
    fn r0_writes_are_discarded() {
        let words = assemble_ok("MOVI R0, #99\nHALT\n");
        let mut sim = Simulator::new();
        sim.load_program(&words, 0).unwrap();
        sim.run(1000);
        assert_eq!(sim.regs.read(0), 0);
    }

    #[test]
    fn flush_empties_if_id_the_cycle_after_a_taken_branch() {
        let words = assemble_ok(
            "MOVI R1, #1\nMOVI R2, #1\nBEQ R1, R2, skip\nMOVI R3, #99\nskip: HALT\n",
        );
        let mut sim = Simulator::new();
        sim.load_program(&words, 0).unwrap();
        for _ in 0..3 {
            sim.step();
        }
        sim.step();
        assert!(sim.if_id.entry.is_none() || sim.id_ex.entry.is_none());
    }
}
