//! Error handling and exit codes.

use tbx_core::{exit_codes, TbxError};

/// Map a toolbox error to the process exit code.
pub fn handle_error(err: &TbxError) -> i32 {
    match err {
        TbxError::InvalidArgument(_) | TbxError::NotOwned(_) | TbxError::StaleList => {
            exit_codes::ERROR_VIOLATION
        }
        TbxError::OutOfMemory { .. }
        | TbxError::PoolExhausted { .. }
        | TbxError::NoSizeClass { .. } => exit_codes::ERROR_OUT_OF_MEMORY,
    }
}

/// Exit code for any error surfaced by [`crate::app::run`].
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(err) = err.downcast_ref::<TbxError>() {
        return handle_error(err);
    }
    if err.downcast_ref::<ConfigError>().is_some() {
        return exit_codes::ERROR_CONFIG;
    }
    exit_codes::ERROR_GENERIC
}

/// Input rejected before any toolbox call was made.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ConfigError(pub String);
