//! Cross-crate integration tests for the MicroTBX-rs workspace live in `tests/`.
