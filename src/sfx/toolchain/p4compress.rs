//! p4compress adapter

use super::{CompressRequest, Compressor, ToolWorkspace, resolve_tool, run_tool, take_output};
use crate::exceptions::{Result, SfxError};
use crate::sfx::defaults::{DEFAULT_COMPRESSOR, ENV_COMPRESSOR, MAX_EFFORT_LEVEL, MIN_EFFORT_LEVEL};
use log::debug;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Compresses the packed library with `p4compress`
#[derive(Debug)]
pub struct P4Compress {
    program: PathBuf,
    workspace: ToolWorkspace,
}

impl P4Compress {
    pub fn new(program: PathBuf, workspace: ToolWorkspace) -> Self {
        P4Compress { program, workspace }
    }

    /// Locate `p4compress` on PATH, honoring `SFXLIB_COMPRESSOR`
    pub fn from_env(workspace: ToolWorkspace) -> Result<Self> {
        Ok(Self::new(
            resolve_tool(ENV_COMPRESSOR, DEFAULT_COMPRESSOR)?,
            workspace,
        ))
    }
}

/// Command line for one compression run
///
/// Mode 0 input starts with its load address (`-raw ADDR`); mode 2 input is a
/// bare binary (`-noprg`).
pub(crate) fn compress_args(
    request: &CompressRequest,
    input: &Path,
    output: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![format!("-m{}", request.mode).into()];
    match request.load_address {
        Some(address) => {
            args.push("-raw".into());
            args.push(address.to_string().into());
        }
        None => args.push("-noprg".into()),
    }
    args.push(format!("-{}", request.effort_level).into());
    args.push(input.into());
    args.push(output.into());
    args
}

impl Compressor for P4Compress {
    fn compress(&mut self, blob: &[u8], request: &CompressRequest) -> Result<Vec<u8>> {
        if !(MIN_EFFORT_LEVEL..=MAX_EFFORT_LEVEL).contains(&request.effort_level) {
            return Err(SfxError::Generic(format!(
                "Compression level {} outside {MIN_EFFORT_LEVEL}-{MAX_EFFORT_LEVEL}",
                request.effort_level
            )));
        }

        let input = self.workspace.scratch_path("blob", "bin");
        let output = self.workspace.scratch_path("compressed", "bin");
        self.workspace.stage(&input, blob)?;
        crate::utils::remove_stale_file(&output)?;

        run_tool(&self.program, &compress_args(request, &input, &output))?;
        fs::remove_file(&input)?;

        let compressed = take_output(&self.program, &output)?;
        debug!(
            "🗜️ Compressed {} bytes to {} bytes (mode {})",
            blob.len(),
            compressed.len(),
            request.mode
        );
        Ok(compressed)
    }
}
