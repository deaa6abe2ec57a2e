//! Application configuration from CLI flags and environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use tbx_core::DEFAULT_HEAP_SIZE;
use tbx_utils::AES256_KEY_LEN;

/// MicroTBX-rs: embedded toolbox with memory pools, checksums, AES-256 and random numbers.
#[derive(Parser, Debug)]
#[command(name = "tbx", version, about)]
pub struct AppConfig {
    /// Heap arena size in bytes.
    #[arg(long, default_value_t = DEFAULT_HEAP_SIZE, env = "TBX_HEAP_SIZE", global = true)]
    pub heap_size: usize,

    /// Verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands of the `tbx` binary.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show toolbox version and build constants.
    Info,

    /// Compute the checksum of a file.
    Checksum {
        /// Checksum algorithm.
        #[arg(long, value_enum, default_value_t = ChecksumAlgo::Crc32)]
        algo: ChecksumAlgo,

        /// File to checksum.
        path: PathBuf,
    },

    /// Encrypt a file with AES-256 in ECB mode.
    Encrypt(CipherArgs),

    /// Decrypt a file with AES-256 in ECB mode.
    Decrypt(CipherArgs),

    /// Print random numbers.
    Random {
        /// How many numbers to print.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Fixed seed, for a reproducible sequence.
        #[arg(long)]
        seed: Option<u32>,
    },

    /// Build memory pools on a fresh heap and report their layout.
    Pools {
        /// Pool layouts as BLOCKSxSIZE, e.g. 4x16.
        #[arg(required = true, value_parser = parse_layout)]
        layouts: Vec<PoolLayout>,

        /// Allocate every block once and release it again.
        #[arg(long)]
        exercise: bool,

        /// Print the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion.
    Completion {
        /// Target shell.
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments shared by `encrypt` and `decrypt`.
#[derive(Args, Debug)]
pub struct CipherArgs {
    /// 256-bit key as 64 hex digits.
    #[arg(long, value_parser = parse_key, env = "TBX_AES_KEY", hide_env_values = true)]
    pub key: [u8; AES256_KEY_LEN],

    /// Input file. Its length must be a multiple of 16 bytes unless --pad is set.
    pub input: PathBuf,

    /// Output file.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Zero-pad the input up to the next 16-byte boundary.
    #[arg(long)]
    pub pad: bool,
}

/// Supported checksum algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChecksumAlgo {
    /// CRC-16/CCITT-FALSE.
    Crc16,
    /// CRC-32/MPEG-2.
    Crc32,
}

/// Requested memory pool: `num_blocks` blocks of `block_size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLayout {
    /// Number of blocks.
    pub num_blocks: usize,
    /// Block size in bytes.
    pub block_size: usize,
}

impl AppConfig {
    /// Parse CLI arguments.
    #[must_use]
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}

/// Parse a pool layout like "4x16".
pub fn parse_layout(s: &str) -> Result<PoolLayout, String> {
    let (blocks, size) = s
        .trim()
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected BLOCKSxSIZE, got '{s}'"))?;
    let num_blocks: usize = blocks
        .parse()
        .map_err(|_| format!("invalid block count '{blocks}'"))?;
    let block_size: usize = size
        .parse()
        .map_err(|_| format!("invalid block size '{size}'"))?;
    if num_blocks == 0 || block_size == 0 {
        return Err("block count and block size must be non-zero".to_string());
    }
    Ok(PoolLayout {
        num_blocks,
        block_size,
    })
}

/// Parse a hex-encoded AES-256 key.
pub fn parse_key(s: &str) -> Result<[u8; AES256_KEY_LEN], String> {
    let key = hex::decode(s.trim()).map_err(|e| format!("invalid hex key: {e}"))?;
    let len = key.len();
    <[u8; AES256_KEY_LEN]>::try_from(key).map_err(|_| {
        format!(
            "key must be {AES256_KEY_LEN} bytes ({} hex digits), got {len} bytes",
            AES256_KEY_LEN * 2
        )
    })
}
