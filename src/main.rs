//! VM Translator - Main Entry Point
//!
//! Usage: vm-translator [OPTIONS] <INIT_FILE> <INPUT_FILE> <OUTPUT_FILE>
//!
//! Reads the segment/page table setup from the init file, translates every
//! virtual address in the input file and writes one physical address (or -1)
//! per input to the output file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};

use vm_translator::io::{read_disk_image, read_virtual_addresses, write_results, InitData};
use vm_translator::{Disk, VMManager, MAX_FRAMES, NUM_FRAMES, ST_FRAMES};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Demand paging iff something starts out on disk
    Auto,
    /// Non-resident page tables and pages are errors
    Basic,
    /// Fault non-resident page tables and pages in from disk
    Demand,
}

#[derive(Parser, Debug)]
#[command(name = "vm-translator")]
#[command(version)]
#[command(about = "Translate virtual addresses through a segment + page table", long_about = None)]
struct Args {
    /// Initialization file with ST/PT definitions
    init_file: PathBuf,

    /// File containing virtual addresses (whitespace-separated)
    input_file: PathBuf,

    /// Output file for physical addresses
    output_file: PathBuf,

    /// Paging disk image of `block offset value` triples
    #[arg(long)]
    disk: Option<PathBuf>,

    /// Demand paging switch
    #[arg(long, value_enum, default_value_t = Mode::Auto)]
    mode: Mode,

    /// Number of physical frames
    #[arg(
        long,
        default_value_t = NUM_FRAMES as u32,
        value_parser = clap::value_parser!(u32).range(ST_FRAMES as i64..=MAX_FRAMES as i64)
    )]
    frames: u32,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let init = InitData::from_file(&args.init_file)
        .with_context(|| format!("loading {}", args.init_file.display()))?;

    let demand_paging = match args.mode {
        Mode::Auto => init.needs_demand_paging(),
        Mode::Basic => false,
        Mode::Demand => true,
    };

    let disk = match &args.disk {
        Some(path) => {
            read_disk_image(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => {
            if demand_paging {
                warn!("demand paging is on but no disk image was given; using a zeroed disk");
            }
            Disk::new()
        }
    };

    info!("Init file:   {}", args.init_file.display());
    info!("Input file:  {}", args.input_file.display());
    info!("Output file: {}", args.output_file.display());
    info!("Segment Table Entries: {}", init.st_entries.len());
    for &(s, length, pointer) in &init.st_entries {
        if pointer >= 0 {
            info!("  Segment {}: length={}, PT in frame {}", s, length, pointer);
        } else {
            info!("  Segment {}: length={}, PT in disk block {}", s, length, -(pointer as i64));
        }
    }
    info!("Page Table Entries: {}", init.pt_entries.len());

    let mut vm = VMManager::from_init(&init, args.frames as usize, disk, demand_paging)
        .context("initializing physical memory")?;
    info!("Disk blocks: {}", vm.disk().block_count());

    let vas = read_virtual_addresses(&args.input_file)
        .with_context(|| format!("loading {}", args.input_file.display()))?;
    info!("Virtual addresses to translate: {}", vas.len());

    let results = vm.translate_batch(&vas).context("translation aborted")?;

    let stats = vm.stats();
    info!(
        "Translated {}: {} ok, {} failed, {} page table faults, {} page faults, {} frames free",
        stats.translations,
        stats.successes,
        stats.failures,
        stats.page_table_faults,
        stats.page_faults,
        vm.free_frames().free_count()
    );

    write_results(&args.output_file, &results)
        .with_context(|| format!("writing {}", args.output_file.display()))?;
    info!("Results written to: {}", args.output_file.display());

    Ok(())
}
