//! Standard exit codes for sfxlib binaries
//!
//! Shared by the builder and the inspector so scripts driving the build can
//! tell toolchain problems apart from template or packing defects.

use crate::exceptions::SfxError;

/// Successful execution
pub const EXIT_SUCCESS: i32 = 0;

/// Generic error (avoid using - be more specific)
pub const EXIT_ERROR: i32 = 1;

/// Panic or unrecoverable error
pub const EXIT_PANIC: i32 = 101;

/// Malformed module library (bad header table, truncated blob)
pub const EXIT_FORMAT_ERROR: i32 = 102;

/// Invalid command-line arguments
pub const EXIT_INVALID_ARGS: i32 = 105;

/// I/O error (file not found, permission denied, disk error)
pub const EXIT_IO_ERROR: i32 = 106;

/// Build/packing error
pub const EXIT_BUILD_ERROR: i32 = 108;

/// Configuration error (mode out of range, template placeholder mismatch)
pub const EXIT_CONFIG_ERROR: i32 = 109;

/// Dependency error (assembler, linker or compressor missing or failing)
pub const EXIT_DEPENDENCY_ERROR: i32 = 110;

/// Map an error onto the exit code reported by the binaries
pub fn exit_code_for(err: &SfxError) -> i32 {
    match err.root_cause() {
        SfxError::ConfigurationRange { .. } | SfxError::TemplateMismatch(_) => EXIT_CONFIG_ERROR,
        SfxError::ExternalTool { .. } => EXIT_DEPENDENCY_ERROR,
        SfxError::Format(_) => EXIT_FORMAT_ERROR,
        SfxError::IoError(_) => EXIT_IO_ERROR,
        SfxError::Packing(_) => EXIT_BUILD_ERROR,
        SfxError::JsonError(_) | SfxError::Generic(_) | SfxError::ModeFailed { .. } => {
            EXIT_ERROR
        }
    }
}
