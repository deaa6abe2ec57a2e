//! AES-256 block encryption, ECB mode, in place.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes256;

use tbx_core::{Assertions, TbxError};

/// AES block length in bytes. Data lengths must be a multiple of this.
pub const AES_BLOCK_LEN: usize = 16;

/// AES-256 key length in bytes.
pub const AES256_KEY_LEN: usize = 32;

#[track_caller]
fn cipher_for(asserts: &Assertions, data: &[u8], key: &[u8]) -> Result<Aes256, TbxError> {
    let valid = !data.is_empty() && data.len() % AES_BLOCK_LEN == 0;
    if !asserts.check(valid) {
        return Err(TbxError::InvalidArgument(
            "data length must be a non-zero multiple of 16 bytes",
        ));
    }
    let Ok(cipher) = Aes256::new_from_slice(key) else {
        asserts.check(false);
        return Err(TbxError::InvalidArgument("AES-256 key must be 32 bytes"));
    };
    Ok(cipher)
}

/// Encrypt `data` in place with AES-256 in ECB mode.
///
/// On a contract violation the data is left untouched.
#[track_caller]
pub fn aes256_encrypt(asserts: &Assertions, data: &mut [u8], key: &[u8]) -> Result<(), TbxError> {
    let cipher = cipher_for(asserts, data, key)?;
    for block in data.chunks_exact_mut(AES_BLOCK_LEN) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    tracing::trace!(len = data.len(), "aes256 encrypt");
    Ok(())
}

/// Decrypt `data` in place with AES-256 in ECB mode.
///
/// On a contract violation the data is left untouched.
#[track_caller]
pub fn aes256_decrypt(asserts: &Assertions, data: &mut [u8], key: &[u8]) -> Result<(), TbxError> {
    let cipher = cipher_for(asserts, data, key)?;
    for block in data.chunks_exact_mut(AES_BLOCK_LEN) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }
    tracing::trace!(len = data.len(), "aes256 decrypt");
    Ok(())
}
