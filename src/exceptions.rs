//! Error types for sfxlib

use std::fmt;

/// Main error type for module library operations
#[derive(Debug)]
pub enum SfxError {
    /// Mode index outside the family's range
    ConfigurationRange {
        /// Family name (`m0` or `m2`)
        family: &'static str,
        /// Rejected mode value
        value: usize,
    },

    /// Template placeholder missing, duplicated or carrying an unexpected default
    TemplateMismatch(String),

    /// Assembler, linker or compressor did not produce its output
    ExternalTool {
        /// Tool name as invoked
        tool: String,
        /// What went wrong
        detail: String,
    },

    /// Blob packer misuse (ordering, overflow, incomplete table)
    Packing(String),

    /// Malformed packed blob
    Format(String),

    /// Failure while building one mode index
    ModeFailed {
        /// Family name (`m0` or `m2`)
        family: &'static str,
        /// Mode index being built
        mode: u8,
        /// Underlying failure
        cause: Box<SfxError>,
    },

    /// IO error
    IoError(std::io::Error),

    /// JSON serialization error
    JsonError(serde_json::Error),

    /// Generic error with message
    Generic(String),
}

impl SfxError {
    /// Wrap an error with the mode index that was being processed
    pub fn for_mode(self, family: &'static str, mode: u8) -> Self {
        SfxError::ModeFailed {
            family,
            mode,
            cause: Box::new(self),
        }
    }

    /// Innermost error, looking through `ModeFailed` wrappers
    pub fn root_cause(&self) -> &SfxError {
        match self {
            SfxError::ModeFailed { cause, .. } => cause.root_cause(),
            other => other,
        }
    }
}

impl fmt::Display for SfxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SfxError::ConfigurationRange { family, value } => {
                write!(f, "Mode index {value} is out of range for family {family}")
            }
            SfxError::TemplateMismatch(msg) => write!(f, "Template mismatch: {msg}"),
            SfxError::ExternalTool { tool, detail } => write!(f, "External tool {tool}: {detail}"),
            SfxError::Packing(msg) => write!(f, "Packing error: {msg}"),
            SfxError::Format(msg) => write!(f, "Invalid module library: {msg}"),
            SfxError::ModeFailed {
                family,
                mode,
                cause,
            } => write!(f, "Mode {family}/{mode}: {cause}"),
            SfxError::IoError(err) => write!(f, "IO error: {err}"),
            SfxError::JsonError(err) => write!(f, "JSON error: {err}"),
            SfxError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for SfxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SfxError::ModeFailed { cause, .. } => Some(cause.as_ref()),
            SfxError::IoError(err) => Some(err),
            SfxError::JsonError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SfxError {
    fn from(err: std::io::Error) -> Self {
        SfxError::IoError(err)
    }
}

impl From<serde_json::Error> for SfxError {
    fn from(err: serde_json::Error) -> Self {
        SfxError::JsonError(err)
    }
}

impl From<anyhow::Error> for SfxError {
    fn from(err: anyhow::Error) -> Self {
        SfxError::Generic(err.to_string())
    }
}

/// Result type for sfxlib operations
pub type Result<T> = std::result::Result<T, SfxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_failed_display_names_mode() {
        let err = SfxError::ExternalTool {
            tool: "ld65".to_string(),
            detail: "no output".to_string(),
        }
        .for_mode("m0", 17);
        assert_eq!(err.to_string(), "Mode m0/17: External tool ld65: no output");
    }

    #[test]
    fn test_root_cause_unwraps_nesting() {
        let err = SfxError::Packing("gap".to_string()).for_mode("m2", 3);
        assert!(matches!(err.root_cause(), SfxError::Packing(_)));
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: SfxError = anyhow::anyhow!("boom").into();
        assert_eq!(err.to_string(), "boom");
    }
}
