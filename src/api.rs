//! High-level API for building and inspecting module libraries

use crate::exceptions::{Result, SfxError};
use crate::sfx::defaults::{DEFAULT_EFFORT_LEVEL, RAW_BLOB_SUFFIX, REPORT_SUFFIX};
use crate::sfx::toolchain::{Ca65Toolchain, P4Compress, ToolWorkspace};
use crate::sfx::{
    BuildReport, Family, ModeIndex, ModuleLibrary, ModuleReport, RunAddress, build_library,
    patch_run_address,
};
use crate::utils::remove_stale_file;
use log::{info, warn};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for building a module library
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Directory holding `decompress0_sfx.s` / `decompress2_sfx.s`
    pub template_dir: PathBuf,
    /// Directory receiving the artifacts
    pub output_dir: PathBuf,
    /// Compressor effort level (1-9)
    pub effort_level: u8,
    /// Keep tool scratch files in this directory instead of a temporary one
    pub work_dir: Option<PathBuf>,
    /// Also write the uncompressed blob (`.raw`)
    pub write_blob: bool,
    /// Also write the JSON build report
    pub write_report: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        BuildOptions {
            template_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            effort_level: DEFAULT_EFFORT_LEVEL,
            work_dir: None,
            write_blob: false,
            write_report: false,
        }
    }
}

impl BuildOptions {
    fn workspace(&self) -> Result<ToolWorkspace> {
        match &self.work_dir {
            Some(dir) => ToolWorkspace::in_dir(dir),
            None => ToolWorkspace::temporary(),
        }
    }

    /// Path of an output file for `family` with its artifact stem and `extension`
    pub fn output_path(&self, family: Family, extension: Option<&str>) -> PathBuf {
        let artifact = self.output_dir.join(family.artifact_file());
        match extension {
            Some(ext) => artifact.with_extension(ext),
            None => artifact,
        }
    }
}

/// Build one family's library with the external toolchain and write its artifact
pub fn build_family(family: Family, options: &BuildOptions) -> Result<BuildReport> {
    let template_path = options.template_dir.join(family.template_file());
    let template = fs::read_to_string(&template_path).map_err(|e| {
        SfxError::Generic(format!(
            "Cannot read template {}: {e}",
            template_path.display()
        ))
    })?;

    let mut compiler = Ca65Toolchain::from_env(options.workspace()?)?;
    let mut compressor = P4Compress::from_env(options.workspace()?)?;

    let artifact_path = options.output_path(family, None);
    remove_stale_file(&artifact_path)?;

    let outcome = build_library(
        family,
        &template,
        &mut compiler,
        &mut compressor,
        options.effort_level,
    )?;

    fs::create_dir_all(&options.output_dir)?;
    fs::write(&artifact_path, &outcome.artifact)?;
    info!(
        "📦 Wrote {} ({} bytes)",
        artifact_path.display(),
        outcome.artifact.len()
    );

    if options.write_blob {
        let blob_path = options.output_path(family, Some(RAW_BLOB_SUFFIX));
        fs::write(&blob_path, outcome.blob.as_bytes())?;
        info!("📦 Wrote {} ({} bytes)", blob_path.display(), outcome.blob.len());
    }

    let report = BuildReport::new(&outcome)?;
    if options.write_report {
        report.write(&options.output_path(family, Some(REPORT_SUFFIX)))?;
    }
    Ok(report)
}

/// Build several families in order, stopping at the first failure
pub fn build_families(families: &[Family], options: &BuildOptions) -> Result<Vec<BuildReport>> {
    families
        .iter()
        .map(|&family| build_family(family, options))
        .collect()
}

/// Description of an existing uncompressed library
#[derive(Debug, Clone, Serialize)]
pub struct LibrarySummary {
    pub family: Family,
    pub path: PathBuf,
    pub size: usize,
    pub load_address: Option<u16>,
    pub data_size: usize,
    pub verified: bool,
    pub modules: Vec<ModuleReport>,
}

/// Parse and verify an uncompressed library file
///
/// A library that parses but fails verification is still summarized, with
/// `verified` unset, so its header can be examined.
pub fn inspect_library(path: &Path, family: Family) -> Result<LibrarySummary> {
    let bytes = fs::read(path)?;
    let library = ModuleLibrary::parse_family(&bytes, family)?;

    let verified = match library.verify() {
        Ok(()) => true,
        Err(e) => {
            warn!("⚠️ {}: {}", path.display(), e);
            false
        }
    };
    let modules = if verified {
        ModuleReport::collect(&library, family)?
    } else {
        Vec::new()
    };

    Ok(LibrarySummary {
        family,
        path: path.to_path_buf(),
        size: bytes.len(),
        load_address: library.layout().load_address,
        data_size: library.data_len(),
        verified,
        modules,
    })
}

/// Copy the module selected by `mode` out of an uncompressed library
///
/// With a run address the module is finished the way the M0 loader does it:
/// the address goes into its last two bytes unless it runs a BASIC program.
pub fn extract_module(
    path: &Path,
    family: Family,
    mode: usize,
    run_address: Option<RunAddress>,
    output: &Path,
) -> Result<usize> {
    let mode = ModeIndex::new(family, mode)?;
    let bytes = fs::read(path)?;
    let library = ModuleLibrary::parse_family(&bytes, family)?;
    let mut module = library.module(mode.slot())?.to_vec();

    if let Some(run_address) = run_address {
        check_run_address(mode, run_address)?;
        patch_run_address(&mut module, run_address)?;
    }

    fs::write(output, &module)?;
    info!(
        "📤 Extracted {} ({} bytes) to {}",
        mode,
        module.len(),
        output.display()
    );
    Ok(module.len())
}

fn check_run_address(mode: ModeIndex, run_address: RunAddress) -> Result<()> {
    if mode.family() != Family::M0 {
        return Err(SfxError::Generic(format!(
            "Run addresses apply to m0 modules only, not {mode}"
        )));
    }
    let runs_basic = mode.value() & 0x20 != 0;
    if runs_basic != run_address.is_basic() {
        return Err(SfxError::Generic(format!(
            "Mode {mode} {} a BASIC program module; run address {run_address:?} does not fit",
            if runs_basic { "is" } else { "is not" }
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sfx::BlobPacker;
    use tempfile::TempDir;

    fn write_m2_library(dir: &Path) -> PathBuf {
        let mut packer = BlobPacker::for_family(Family::M2);
        for slot in 0..Family::M2.mode_count() {
            packer.push(slot, &vec![slot as u8; 3]).unwrap();
        }
        let path = dir.join("sfxdecomp2.raw");
        fs::write(&path, packer.finish().unwrap().as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_output_paths() {
        let options = BuildOptions {
            output_dir: PathBuf::from("out"),
            ..BuildOptions::default()
        };
        assert_eq!(
            options.output_path(Family::M0, None),
            PathBuf::from("out/sfxdecomp0.prg")
        );
        assert_eq!(
            options.output_path(Family::M0, Some(RAW_BLOB_SUFFIX)),
            PathBuf::from("out/sfxdecomp0.raw")
        );
        assert_eq!(
            options.output_path(Family::M2, Some(REPORT_SUFFIX)),
            PathBuf::from("out/sfxdecomp2.json")
        );
        assert_eq!(options.effort_level, 9);
    }

    #[test]
    fn test_missing_template_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let options = BuildOptions {
            template_dir: temp_dir.path().to_path_buf(),
            output_dir: temp_dir.path().to_path_buf(),
            ..BuildOptions::default()
        };
        let err = build_family(Family::M0, &options).unwrap_err();
        assert!(err.to_string().contains("decompress0_sfx.s"), "{err}");
        assert!(!temp_dir.path().join("sfxdecomp0.prg").exists());
    }

    #[test]
    fn test_inspect_library() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_m2_library(temp_dir.path());

        let summary = inspect_library(&path, Family::M2).unwrap();
        assert!(summary.verified);
        assert_eq!(summary.size, 512 + 128 * 3);
        assert_eq!(summary.data_size, 128 * 3);
        assert_eq!(summary.load_address, None);
        assert_eq!(summary.modules.len(), 128);
        assert_eq!(summary.modules[7].offset, 512 + 21);
    }

    #[test]
    fn test_inspect_reports_unverified_library() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_m2_library(temp_dir.path());
        let mut bytes = fs::read(&path).unwrap();
        bytes.push(0xFF);
        fs::write(&path, bytes).unwrap();

        let summary = inspect_library(&path, Family::M2).unwrap();
        assert!(!summary.verified);
        assert!(summary.modules.is_empty());
    }

    #[test]
    fn test_inspect_with_wrong_family_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_m2_library(temp_dir.path());
        // The first M2 header entry does not read as the $2000 load address
        assert!(inspect_library(&path, Family::M0).is_err());
    }

    #[test]
    fn test_extract_module() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_m2_library(temp_dir.path());
        let output = temp_dir.path().join("mode100.bin");

        assert_eq!(extract_module(&path, Family::M2, 100, None, &output).unwrap(), 3);
        assert_eq!(fs::read(&output).unwrap(), vec![100u8; 3]);

        let err = extract_module(&path, Family::M2, 128, None, &output).unwrap_err();
        assert!(matches!(err, SfxError::ConfigurationRange { value: 128, .. }));
    }

    fn write_m0_library(dir: &Path) -> PathBuf {
        let mut packer = BlobPacker::for_family(Family::M0);
        for slot in 0..Family::M0.mode_count() {
            packer.push(slot, &[slot as u8, 0xEE, 0xEE]).unwrap();
        }
        let path = dir.join("sfxdecomp0.raw");
        fs::write(&path, packer.finish().unwrap().as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_extract_m0_module_with_run_address() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_m0_library(temp_dir.path());
        let output = temp_dir.path().join("module.bin");

        extract_module(&path, Family::M0, 3, Some(RunAddress::Monitor), &output).unwrap();
        assert_eq!(fs::read(&output).unwrap(), [3, 0x52, 0xFF]);

        extract_module(&path, Family::M0, 3, Some(RunAddress::from_raw(-2)), &output).unwrap();
        assert_eq!(fs::read(&output).unwrap(), [3, 0x7E, 0x86]);

        // BASIC modules keep their own tail
        extract_module(&path, Family::M0, 33, Some(RunAddress::Basic), &output).unwrap();
        assert_eq!(fs::read(&output).unwrap(), [33, 0xEE, 0xEE]);
    }

    #[test]
    fn test_run_address_must_match_mode() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_m0_library(temp_dir.path());
        let output = temp_dir.path().join("module.bin");

        assert!(extract_module(&path, Family::M0, 33, Some(RunAddress::Ready), &output).is_err());
        assert!(extract_module(&path, Family::M0, 3, Some(RunAddress::Basic), &output).is_err());
        assert!(!output.exists());

        let m2 = write_m2_library(temp_dir.path());
        let err = extract_module(&m2, Family::M2, 3, Some(RunAddress::Ready), &output).unwrap_err();
        assert!(err.to_string().contains("m0 modules only"), "{err}");
    }
}
