//! Application entry point and dispatch.

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use tbx_core::{ADDRESS_ALIGN, HEAP_BASE_ADDR};
use tbx_memory::{BlockPtr, PoolStats, SizeClassInfo};
use tbx_utils::AES_BLOCK_LEN;

use crate::config::{AppConfig, ChecksumAlgo, CipherArgs, Command, PoolLayout};
use crate::errors::ConfigError;
use crate::toolbox::{Toolbox, ToolboxConfig};
use crate::version;

/// Run the application, writing command output to stdout.
pub fn run(config: &AppConfig) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_with_output(config, &mut out)
}

/// Run the application, writing command output to `out`.
pub fn run_with_output(config: &AppConfig, out: &mut dyn Write) -> Result<()> {
    match &config.command {
        Command::Completion { shell } => {
            let mut cmd = <AppConfig as clap::CommandFactory>::command();
            clap_complete::generate(*shell, &mut cmd, "tbx", out);
            Ok(())
        }
        Command::Info => run_info(config, out),
        Command::Checksum { algo, path } => run_checksum(config, *algo, path, out),
        Command::Encrypt(args) => run_cipher(config, args, Direction::Encrypt, out),
        Command::Decrypt(args) => run_cipher(config, args, Direction::Decrypt, out),
        Command::Random { count, seed } => run_random(config, *count, *seed, out),
        Command::Pools {
            layouts,
            exercise,
            json,
        } => run_pools(config, layouts, *exercise, *json, out),
    }
}

fn toolbox(config: &AppConfig) -> Toolbox {
    Toolbox::new(ToolboxConfig::default().with_heap_size(config.heap_size))
}

fn run_info(config: &AppConfig, out: &mut dyn Write) -> Result<()> {
    writeln!(out, "{}", version::full_version())?;
    writeln!(out, "heap size:      {} bytes", config.heap_size)?;
    writeln!(out, "heap base:      {HEAP_BASE_ADDR:#010x}")?;
    writeln!(out, "address align:  {ADDRESS_ALIGN} bytes")?;
    Ok(())
}

fn run_checksum(
    config: &AppConfig,
    algo: ChecksumAlgo,
    path: &std::path::Path,
    out: &mut dyn Write,
) -> Result<()> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if data.is_empty() {
        return Err(ConfigError(format!("{} is empty", path.display())).into());
    }
    let toolbox = toolbox(config);
    match algo {
        ChecksumAlgo::Crc16 => writeln!(out, "{:04x}  {}", toolbox.crc16(&data), path.display())?,
        ChecksumAlgo::Crc32 => writeln!(out, "{:08x}  {}", toolbox.crc32(&data), path.display())?,
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Encrypt,
    Decrypt,
}

fn run_cipher(
    config: &AppConfig,
    args: &CipherArgs,
    direction: Direction,
    out: &mut dyn Write,
) -> Result<()> {
    let mut data =
        fs::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;
    if args.pad {
        let padded = data.len().div_ceil(AES_BLOCK_LEN).max(1) * AES_BLOCK_LEN;
        data.resize(padded, 0);
    }
    if data.is_empty() || data.len() % AES_BLOCK_LEN != 0 {
        return Err(ConfigError(format!(
            "input length {} is not a non-zero multiple of {AES_BLOCK_LEN} bytes (use --pad)",
            data.len()
        ))
        .into());
    }

    let toolbox = toolbox(config);
    let verb = match direction {
        Direction::Encrypt => {
            toolbox.aes256_encrypt(&mut data, &args.key)?;
            "encrypted"
        }
        Direction::Decrypt => {
            toolbox.aes256_decrypt(&mut data, &args.key)?;
            "decrypted"
        }
    };
    fs::write(&args.output, &data)
        .with_context(|| format!("writing {}", args.output.display()))?;
    writeln!(
        out,
        "{verb} {} bytes -> {}",
        data.len(),
        args.output.display()
    )?;
    Ok(())
}

fn run_random(
    config: &AppConfig,
    count: usize,
    seed: Option<u32>,
    out: &mut dyn Write,
) -> Result<()> {
    let toolbox = toolbox(config);
    if let Some(seed) = seed {
        toolbox
            .random()
            .set_seed_init_handler(Some(Box::new(move || seed)));
    }
    for _ in 0..count {
        writeln!(out, "{}", toolbox.random().number_get())?;
    }
    Ok(())
}

/// Layout report printed by the `pools` command.
#[derive(Debug, Serialize)]
pub struct PoolReport {
    /// Heap arena capacity in bytes.
    pub heap_capacity: usize,
    /// Heap bytes left after building the pools.
    pub heap_free: usize,
    /// One entry per size class, ascending.
    pub classes: Vec<SizeClassInfo>,
    /// Pool counters.
    pub stats: PoolStats,
}

fn run_pools(
    config: &AppConfig,
    layouts: &[PoolLayout],
    exercise: bool,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let mut toolbox = toolbox(config);
    for layout in layouts {
        toolbox
            .mem_pool_create(layout.num_blocks, layout.block_size)
            .with_context(|| {
                format!(
                    "creating pool of {} x {} byte blocks",
                    layout.num_blocks, layout.block_size
                )
            })?;
    }

    if exercise {
        let mut blocks: Vec<BlockPtr> = Vec::new();
        for class in toolbox.size_classes() {
            for _ in 0..class.free {
                blocks.push(toolbox.mem_pool_allocate(class.block_size)?);
            }
        }
        for ptr in blocks {
            toolbox.mem_pool_release(ptr)?;
        }
    }

    let report = PoolReport {
        heap_capacity: toolbox.heap().capacity(),
        heap_free: toolbox.heap_get_free(),
        classes: toolbox.size_classes(),
        stats: toolbox.pool_stats(),
    };

    if json {
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        return Ok(());
    }

    writeln!(
        out,
        "heap: {} bytes, {} free",
        report.heap_capacity, report.heap_free
    )?;
    writeln!(
        out,
        "{:>10} {:>7} {:>6} {:>6} {:>9}",
        "block size", "blocks", "free", "used", "segments"
    )?;
    for class in &report.classes {
        writeln!(
            out,
            "{:>10} {:>7} {:>6} {:>6} {:>9}",
            class.block_size, class.block_count, class.free, class.used, class.segments
        )?;
    }
    if exercise {
        writeln!(
            out,
            "exercised: {} allocations, {} releases",
            report.stats.allocations, report.stats.releases
        )?;
    }
    Ok(())
}
