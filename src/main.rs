//! pagesim - Demand-Paged Machine Simulator
//!
//! Usage: pagesim [OPTIONS] <program>
//!
//! Loads an assembly program into a demand-paged virtual memory, runs it on
//! the simulated CPU, and prints the final register file followed by paging
//! statistics. Every instruction fetch, load, and store goes through address
//! translation, so the choice of replacement policy shows up directly in the
//! fault and disk counters.

use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};

use pagesim::config::{
    DEFAULT_FRAMES, DEFAULT_PAGE_SIZE, DEFAULT_PAGES, DEFAULT_SWAP_SLOTS, PolicyKind, VmConfig,
};
use pagesim::cpu::{Machine, MachineError};
use pagesim::program::Program;
use pagesim::vm::VmManager;

/// Run an assembly program on a demand-paged machine simulator.
#[derive(Debug, Parser)]
#[command(name = "pagesim", version)]
struct Args {
    /// Assembly program to load and run
    program: PathBuf,

    /// Page replacement policy
    #[arg(long, value_enum, default_value_t = PolicyArg::Fifo)]
    policy: PolicyArg,

    /// Seed for the random policy (defaults to OS entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Physical memory size in frames
    #[arg(long, default_value_t = DEFAULT_FRAMES as u64,
          value_parser = clap::value_parser!(u64).range(1..))]
    frames: u64,

    /// Virtual address space size in pages
    #[arg(long, default_value_t = DEFAULT_PAGES as u64,
          value_parser = clap::value_parser!(u64).range(1..))]
    pages: u64,

    /// Words per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE as u64,
          value_parser = clap::value_parser!(u64).range(1..))]
    page_size: u64,

    /// Swap store capacity in pages
    #[arg(long, default_value_t = DEFAULT_SWAP_SLOTS as u64)]
    swap_slots: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    Fifo,
    Random,
    SecondChance,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), MachineError> {
    let policy = match args.policy {
        PolicyArg::Fifo => PolicyKind::Fifo,
        PolicyArg::Random => PolicyKind::Random {
            seed: args.seed.unwrap_or_else(rand::random),
        },
        PolicyArg::SecondChance => PolicyKind::SecondChance,
    };
    let config = VmConfig::default()
        .with_page_size(args.page_size as usize)
        .with_frames(args.frames as usize)
        .with_pages(args.pages as usize)
        .with_swap_slots(args.swap_slots as usize)
        .with_policy(policy);

    let program = Program::from_file(&args.program)?;
    let mut machine = Machine::new(VmManager::new(config));
    machine.load_program(&program)?;
    machine.run()?;

    print!("{}", machine.cpu);

    let stats = machine.vm.stats();
    println!("======= STATISTICS =======");
    println!("page faults: {}", stats.page_faults);
    println!("disk writes: {}", stats.disk_writes);
    println!("disk reads: {}", stats.disk_reads);

    Ok(())
}
