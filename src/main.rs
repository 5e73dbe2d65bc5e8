//! Pipeline simulator CLI.
//!
//! Reads an assembly source file, assembles it, loads the result into
//! memory, and runs the five-stage pipeline to completion or a cycle
//! cap.

use clap::Parser;
use std::{fs, path::PathBuf, process};

use pipesim::config::Config;
use pipesim::Simulator;

/// Command-line arguments for the pipeline simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Cycle-accurate 32-bit pipeline simulator")]
struct Args {
    /// Assembly source file to assemble and run.
    program: PathBuf,

    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Overrides the configured cycle cap.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Enables per-stage tracing to stderr.
    #[arg(long)]
    trace: bool,

    /// Dumps the final register file and a trace JSON to this path.
    #[arg(long)]
    dump_trace: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("failed to load config {}: {}", path.display(), e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let trace = args.trace || config.general.trace;
    let max_cycles = args.max_cycles.unwrap_or(config.general.max_cycles);
    let load_base = config.general.load_base_val();

    println!("Global Configuration");
    println!("--------------------");
    println!("General:");
    println!("  Trace:       {}", trace);
    println!("  Load base:   {:#010x}", load_base);
    println!("  Max cycles:  {}", max_cycles);

    let source = match fs::read_to_string(&args.program) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("failed to read {}: {}", args.program.display(), e);
            process::exit(1);
        }
    };

    let words = match Simulator::assemble(&source) {
        Ok(words) => words,
        Err(errors) => {
            eprintln!("assembly failed with {} error(s):", errors.len());
            for e in &errors {
                eprintln!("  {}", e);
            }
            process::exit(1);
        }
    };

    let mut sim = Simulator::new();
    sim.trace = trace;
    if let Err(e) = sim.load_program(&words, load_base) {
        eprintln!("failed to load program: {}", e);
        process::exit(1);
    }
    sim.regs.pc = load_base;

    let summary = sim.run(max_cycles);

    for warning in sim.history.warnings() {
        eprintln!("warning: {}", warning);
    }

    if let Some(path) = &args.dump_trace {
        if let Err(e) = sim.history.save(path) {
            eprintln!("failed to write trace to {}: {}", path.display(), e);
        }
    }

    sim.stats.print();

    if let Some(fault) = &sim.fault {
        eprintln!("halted on fault: {}", fault);
        process::exit(1);
    }

    if summary.cycles >= max_cycles && sim.fault.is_none() {
        eprintln!("stopped at cycle cap ({} cycles)", max_cycles);
        process::exit(1);
    }

    process::exit(0);
}
