//! Simulation statistics collection and reporting.
//!
//! Tracks cycle count, retirement count, and stall count -- enough to
//! derive IPC. The pipeline is single-issue and strictly in-order, so
//! there is no cache hierarchy or branch predictor to report on here.

use std::time::Instant;

/// Simulation statistics structure tracking the run's headline numbers.
pub struct SimStats {
    start_time: Instant,
    pub cycles: u64,
    pub instructions_committed: u64,
    pub stall_cycles: u64,
}

impl Default for SimStats {
    fn default() -> Self {
        Self {
            start_time: Instant::now(),
            cycles: 0,
            instructions_committed: 0,
            stall_cycles: 0,
        }
    }
}

impl SimStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Instructions committed per cycle, 0.0 if no cycles have run.
    pub fn ipc(&self) -> f64 {
        if self.cycles == 0 {
            0.0
        } else {
            self.instructions_committed as f64 / self.cycles as f64
        }
    }

    /// Prints a formatted summary of the run's statistics.
    pub fn print(&self) {
        let duration = self.start_time.elapsed();
        let seconds = duration.as_secs_f64();
        let khz = if seconds > 0.0 {
            (self.cycles as f64 / seconds) / 1000.0
        } else {
            0.0
        };

        println!("\n==========================================================");
        println!("PIPELINE SIMULATION STATISTICS");
        println!("==========================================================");
        println!("host_seconds             {:.4} s", seconds);
        println!("sim_cycles               {}", self.cycles);
        println!("sim_freq                 {:.2} kHz", khz);
        println!("sim_insts                {}", self.instructions_committed);
        println!("sim_ipc                  {:.4}", self.ipc());
        println!("stall_cycles             {}", self.stall_cycles);
        println!("==========================================================");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipc_is_zero_with_no_cycles() {
        let s = SimStats::new();
        assert_eq!(s.ipc(), 0.0);
    }

    #[test]
    fn ipc_divides_committed_by_cycles() {
        let mut s = SimStats::new();
        s.cycles = 4;
        s.instructions_committed = 2;
        assert!((s.ipc() - 0.5).abs() < f64::EPSILON);
    }
}
