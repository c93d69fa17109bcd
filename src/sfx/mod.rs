//! Self-extractor decompressor module library
//!
//! Two mode families share one pipeline: every mode index is decoded into a
//! [`VariantConfig`], the family's assembly template is parameterized with it,
//! the result is compiled by an external toolchain, and all compiled modules are
//! packed behind a header table of `(offset, length)` pairs before compression.

pub mod builder;
pub mod constants;
pub mod defaults;
pub mod index;
pub mod packer;
pub mod reader;
pub mod report;
pub mod template;
pub mod toolchain;
pub mod variant;

use crate::exceptions::{Result, SfxError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub use builder::{BuildOutcome, build_library, pack_variants};
pub use index::{HeaderEntry, HeaderTable, PackLayout};
pub use packer::{BlobPacker, PackedBlob};
pub use reader::ModuleLibrary;
pub use report::{BuildReport, ModuleReport};
pub use template::{Placeholder, parameterize};
pub use variant::{
    M0Options, M0Variant, M2Variant, ModeIndex, RunAddress, VariantConfig, patch_run_address,
};

/// Mode family: one template, one bit layout, one packed library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    /// Compression mode 0 decompressors, 64 modes, loaded as a PRG at $2000
    M0,
    /// Compression mode 2 decompressors, 128 modes, raw binary
    M2,
}

impl Family {
    /// Both families, in build order
    pub const ALL: [Family; 2] = [Family::M0, Family::M2];

    /// Short lowercase name used in logs, errors and file names
    pub fn name(self) -> &'static str {
        match self {
            Family::M0 => "m0",
            Family::M2 => "m2",
        }
    }

    /// Number of mode indices in this family
    pub fn mode_count(self) -> usize {
        match self {
            Family::M0 => constants::M0_MODE_COUNT,
            Family::M2 => constants::M2_MODE_COUNT,
        }
    }

    /// Packed blob layout for this family
    pub fn layout(self) -> PackLayout {
        match self {
            Family::M0 => PackLayout {
                mode_count: constants::M0_MODE_COUNT,
                base_offset: constants::M0_BASE_OFFSET,
                load_address: Some(constants::M0_LOAD_ADDRESS),
            },
            Family::M2 => PackLayout {
                mode_count: constants::M2_MODE_COUNT,
                base_offset: constants::M2_BASE_OFFSET,
                load_address: None,
            },
        }
    }

    /// `--target` passed to the assembler and linker
    pub fn assembler_target(self) -> &'static str {
        match self {
            Family::M0 => defaults::M0_ASSEMBLER_TARGET,
            Family::M2 => defaults::M2_ASSEMBLER_TARGET,
        }
    }

    /// Compressor mode used for the finished library
    pub fn compression_mode(self) -> u8 {
        match self {
            Family::M0 => constants::COMPRESSION_MODE_M0,
            Family::M2 => constants::COMPRESSION_MODE_M2,
        }
    }

    pub fn template_file(self) -> &'static str {
        match self {
            Family::M0 => defaults::M0_TEMPLATE_FILE,
            Family::M2 => defaults::M2_TEMPLATE_FILE,
        }
    }

    pub fn artifact_file(self) -> &'static str {
        match self {
            Family::M0 => defaults::M0_ARTIFACT_FILE,
            Family::M2 => defaults::M2_ARTIFACT_FILE,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Family {
    type Err = SfxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "m0" | "0" => Ok(Family::M0),
            "m2" | "2" => Ok(Family::M2),
            other => Err(SfxError::Generic(format!(
                "Unknown module family '{other}' (expected m0 or m2)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_layouts() {
        let m0 = Family::M0.layout();
        assert_eq!(m0.header_size(), 256);
        assert_eq!(m0.base_offset, 0x2000 + 256);
        assert_eq!(m0.load_address, Some(0x2000));

        let m2 = Family::M2.layout();
        assert_eq!(m2.header_size(), 512);
        assert_eq!(m2.base_offset, 512);
        assert_eq!(m2.load_address, None);
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("m0".parse::<Family>().unwrap(), Family::M0);
        assert_eq!("M2".parse::<Family>().unwrap(), Family::M2);
        assert!("m1".parse::<Family>().is_err());
    }
}
