//! CRC16 and CRC32 checksums.
//!
//! Both are MSB-first, table driven and without output reflection or final
//! XOR: CRC-16/CCITT-FALSE and CRC-32/MPEG-2.

use tbx_core::Assertions;

const CRC16_POLY: u16 = 0x1021;
const CRC16_INIT: u16 = 0xFFFF;
const CRC32_POLY: u32 = 0x04C1_1DB7;
const CRC32_INIT: u32 = 0xFFFF_FFFF;

/// Byte-wise lookup table for CRC-16/CCITT-FALSE.
pub const CRC16_TABLE: [u16; 256] = {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        #[allow(clippy::cast_possible_truncation)]
        let mut crc = (i as u16) << 8;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ CRC16_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Byte-wise lookup table for CRC-32/MPEG-2.
pub const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        #[allow(clippy::cast_possible_truncation)]
        let mut crc = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 0x8000_0000 != 0 {
                (crc << 1) ^ CRC32_POLY
            } else {
                crc << 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// CRC-16/CCITT-FALSE of `data`.
///
/// Empty input is a contract violation and yields `0`.
#[track_caller]
#[allow(clippy::cast_possible_truncation)]
pub fn crc16_calculate(asserts: &Assertions, data: &[u8]) -> u16 {
    if !asserts.check(!data.is_empty()) {
        return 0;
    }
    data.iter().fold(CRC16_INIT, |crc, &byte| {
        let index = usize::from((crc >> 8) as u8 ^ byte);
        (crc << 8) ^ CRC16_TABLE[index]
    })
}

/// CRC-32/MPEG-2 of `data`.
///
/// Empty input is a contract violation and yields `0`.
#[track_caller]
#[allow(clippy::cast_possible_truncation)]
pub fn crc32_calculate(asserts: &Assertions, data: &[u8]) -> u32 {
    if !asserts.check(!data.is_empty()) {
        return 0;
    }
    data.iter().fold(CRC32_INIT, |crc, &byte| {
        let index = usize::from((crc >> 24) as u8 ^ byte);
        (crc << 8) ^ CRC32_TABLE[index]
    })
}
