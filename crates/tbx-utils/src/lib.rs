//! # tbx-utils
//!
//! Auxiliary utilities of the MicroTBX-rs toolbox: a seedable random number
//! generator, CRC16/CRC32 checksums and AES-256 block encryption.
#![warn(missing_docs)]

pub mod checksum;
pub mod crypto;
pub mod random;

// Re-exports
pub use checksum::{crc16_calculate, crc32_calculate};
pub use crypto::{aes256_decrypt, aes256_encrypt, AES256_KEY_LEN, AES_BLOCK_LEN};
pub use random::{Random, SeedInitHandler};
