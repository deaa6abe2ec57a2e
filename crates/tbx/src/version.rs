//! Version information.

use tbx_core::{VERSION_MAIN, VERSION_MINOR, VERSION_PATCH};

/// Get the crate version string.
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Toolbox API version assembled from the compile-time constants.
#[must_use]
pub fn toolbox_version() -> String {
    format!("{VERSION_MAIN}.{VERSION_MINOR}.{VERSION_PATCH}")
}

/// Get the full version string.
#[must_use]
pub fn full_version() -> String {
    format!("tbx {} (toolbox {})", version(), toolbox_version())
}
