//! External tool adapters
//!
//! The pipeline only sees the [`Compiler`] and [`Compressor`] traits; the
//! `ca65`/`ld65` and `p4compress` implementations shell out and exchange data
//! through files in a [`ToolWorkspace`].

mod ca65;
mod p4compress;

pub use ca65::Ca65Toolchain;
pub use p4compress::P4Compress;

use super::Family;
use crate::exceptions::{Result, SfxError};
use crate::utils::remove_stale_file;
use log::{debug, trace};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Turns parameterized source text into a raw binary module
pub trait Compiler {
    fn compile(&mut self, source: &str, target: &str) -> Result<Vec<u8>>;
}

/// Compresses the packed module library
pub trait Compressor {
    fn compress(&mut self, blob: &[u8], request: &CompressRequest) -> Result<Vec<u8>>;
}

/// Fixed compressor parameters for one family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressRequest {
    /// Compression mode (0 or 2)
    pub mode: u8,
    /// Load address embedded at the start of the input, if any
    pub load_address: Option<u16>,
    /// Compression level 1-9
    pub effort_level: u8,
}

impl CompressRequest {
    pub fn for_family(family: Family, effort_level: u8) -> Self {
        CompressRequest {
            mode: family.compression_mode(),
            load_address: family.layout().load_address,
            effort_level,
        }
    }
}

#[derive(Debug)]
enum WorkspaceRoot {
    Temporary(TempDir),
    Fixed(PathBuf),
}

/// Directory holding the per-invocation scratch files
///
/// A temporary workspace is removed on drop; a fixed one is left in place so
/// intermediate files can be examined after a failed build.
#[derive(Debug)]
pub struct ToolWorkspace {
    root: WorkspaceRoot,
}

impl ToolWorkspace {
    /// Fresh private temporary directory
    pub fn temporary() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(super::defaults::TEMP_DIR_PREFIX)
            .tempdir()?;
        trace!("📁 Created tool workspace {}", dir.path().display());
        Ok(ToolWorkspace {
            root: WorkspaceRoot::Temporary(dir),
        })
    }

    /// Use (and create if needed) a caller-chosen directory
    pub fn in_dir(path: &Path) -> Result<Self> {
        fs::create_dir_all(path)?;
        Ok(ToolWorkspace {
            root: WorkspaceRoot::Fixed(path.to_path_buf()),
        })
    }

    pub fn path(&self) -> &Path {
        match &self.root {
            WorkspaceRoot::Temporary(dir) => dir.path(),
            WorkspaceRoot::Fixed(path) => path,
        }
    }

    /// Scratch file name distinguished by process id
    pub fn scratch_path(&self, stem: &str, extension: &str) -> PathBuf {
        self.path()
            .join(format!("__{stem}_{}__.{extension}", std::process::id()))
    }

    /// Write a scratch file, replacing any stale copy
    pub fn stage(&self, path: &Path, contents: &[u8]) -> Result<()> {
        remove_stale_file(path)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

/// Resolve a tool from an environment override or its default name
pub fn resolve_tool(env_key: &str, default_name: &str) -> Result<PathBuf> {
    let requested = env::var(env_key).unwrap_or_else(|_| default_name.to_string());
    let resolved = which::which(&requested).map_err(|e| SfxError::ExternalTool {
        tool: requested.clone(),
        detail: format!("not found ({e}); set {env_key} to its path"),
    })?;
    debug!("🔍 Resolved {} to {}", requested, resolved.display());
    Ok(resolved)
}

fn tool_name(program: &Path) -> String {
    program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string())
}

/// Run a tool to completion; a non-zero exit is an error
pub(crate) fn run_tool(program: &Path, args: &[OsString]) -> Result<()> {
    let tool = tool_name(program);
    debug!(
        "🔧 {} {}",
        tool,
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| SfxError::ExternalTool {
            tool: tool.clone(),
            detail: format!("failed to start: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SfxError::ExternalTool {
            tool,
            detail: format!("{} {}", output.status, stderr.trim()),
        });
    }
    Ok(())
}

/// Error for a tool that exited without writing its output file
pub(crate) fn missing_output(tool: &Path, path: &Path) -> SfxError {
    SfxError::ExternalTool {
        tool: tool_name(tool),
        detail: format!("did not produce {}", path.display()),
    }
}

/// Read a tool's output file and remove it
pub(crate) fn take_output(tool: &Path, path: &Path) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(missing_output(tool, path));
    }
    let data = fs::read(path)?;
    fs::remove_file(path)?;
    Ok(data)
}
