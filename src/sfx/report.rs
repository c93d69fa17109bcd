//! Build and inspection reports
//!
//! Checksums use the `algorithm:hexvalue` notation (`sha256:...`, `adler32:...`).

use super::Family;
use super::builder::BuildOutcome;
use super::reader::ModuleLibrary;
use super::variant::{ModeIndex, VariantConfig};
use crate::exceptions::Result;
use chrono::Utc;
use log::debug;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Where one module sits in the library and what it was built for
#[derive(Debug, Clone, Serialize)]
pub struct ModuleReport {
    pub mode: u8,
    pub offset: u16,
    pub length: u16,
    pub start_address: u16,
    pub checksum: String,
    pub config: VariantConfig,
}

impl ModuleReport {
    /// Describe every module of a parsed library
    pub fn collect(library: &ModuleLibrary<'_>, family: Family) -> Result<Vec<Self>> {
        let mut reports = Vec::with_capacity(library.entries().len());
        for (slot, entry) in library.entries().iter().enumerate() {
            let mode = ModeIndex::new(family, slot)?;
            let config = VariantConfig::decode(mode);
            let bytes = library.module(slot)?;
            reports.push(ModuleReport {
                mode: mode.value(),
                offset: entry.offset,
                length: entry.length,
                start_address: config.start_address(),
                checksum: format!("adler32:{:08x}", adler::adler32_slice(bytes)),
                config,
            });
        }
        Ok(reports)
    }
}

/// Summary of one built library, written next to the artifact
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub family: Family,
    pub generated_at: String,
    pub builder_version: String,
    pub mode_count: usize,
    pub load_address: Option<u16>,
    pub blob_size: usize,
    pub artifact_file: String,
    pub artifact_size: usize,
    pub artifact_checksum: String,
    pub modules: Vec<ModuleReport>,
}

impl BuildReport {
    pub fn new(outcome: &BuildOutcome) -> Result<Self> {
        let library = ModuleLibrary::parse(outcome.blob.as_bytes(), *outcome.blob.layout())?;
        let modules = ModuleReport::collect(&library, outcome.family)?;

        Ok(BuildReport {
            family: outcome.family,
            generated_at: Utc::now().to_rfc3339(),
            builder_version: crate::version::VERSION.to_string(),
            mode_count: outcome.family.mode_count(),
            load_address: outcome.blob.layout().load_address,
            blob_size: outcome.blob.len(),
            artifact_file: outcome.family.artifact_file().to_string(),
            artifact_size: outcome.artifact.len(),
            artifact_checksum: format!("sha256:{}", hex::encode(Sha256::digest(&outcome.artifact))),
            modules,
        })
    }

    /// Total bytes of compiled module code
    pub fn code_size(&self) -> usize {
        self.modules.iter().map(|m| m.length as usize).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        debug!("📝 Wrote build report {}", path.display());
        Ok(())
    }
}
