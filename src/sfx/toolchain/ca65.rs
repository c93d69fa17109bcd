//! cc65 assembler/linker adapter

use super::{Compiler, ToolWorkspace, missing_output, resolve_tool, run_tool, take_output};
use crate::exceptions::Result;
use crate::sfx::defaults::{DEFAULT_ASSEMBLER, DEFAULT_LINKER, ENV_ASSEMBLER, ENV_LINKER};
use log::trace;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Compiles module sources with `ca65` and links them with `ld65`
#[derive(Debug)]
pub struct Ca65Toolchain {
    assembler: PathBuf,
    linker: PathBuf,
    workspace: ToolWorkspace,
}

impl Ca65Toolchain {
    pub fn new(assembler: PathBuf, linker: PathBuf, workspace: ToolWorkspace) -> Self {
        Ca65Toolchain {
            assembler,
            linker,
            workspace,
        }
    }

    /// Locate `ca65`/`ld65` on PATH, honoring `SFXLIB_CA65`/`SFXLIB_LD65`
    pub fn from_env(workspace: ToolWorkspace) -> Result<Self> {
        let assembler = resolve_tool(ENV_ASSEMBLER, DEFAULT_ASSEMBLER)?;
        let linker = resolve_tool(ENV_LINKER, DEFAULT_LINKER)?;
        Ok(Self::new(assembler, linker, workspace))
    }

    /// `ca65 --target T source -o object`
    pub fn assemble(&self, source: &Path, target: &str) -> Result<PathBuf> {
        let object = self.workspace.scratch_path("ca65_tmp", "o");
        crate::utils::remove_stale_file(&object)?;
        run_tool(&self.assembler, &tool_args(target, source, &object))?;
        Ok(object)
    }

    /// `ld65 --target T object -o binary`
    pub fn link(&self, object: &Path, target: &str) -> Result<PathBuf> {
        let binary = self.workspace.scratch_path("ld65_tmp", "prg");
        crate::utils::remove_stale_file(&binary)?;
        run_tool(&self.linker, &tool_args(target, object, &binary))?;
        Ok(binary)
    }
}

fn tool_args(target: &str, input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "--target".into(),
        target.into(),
        input.into(),
        "-o".into(),
        output.into(),
    ]
}

impl Compiler for Ca65Toolchain {
    fn compile(&mut self, source: &str, target: &str) -> Result<Vec<u8>> {
        let source_path = self.workspace.scratch_path("ca65_tmp", "s");
        self.workspace.stage(&source_path, source.as_bytes())?;

        let object = self.assemble(&source_path, target)?;
        fs::remove_file(&source_path)?;
        if !object.exists() {
            return Err(missing_output(&self.assembler, &object));
        }

        let binary = self.link(&object, target)?;
        fs::remove_file(&object)?;

        let bytes = take_output(&self.linker, &binary)?;
        trace!("🧩 Compiled {} source bytes into {} bytes", source.len(), bytes.len());
        Ok(bytes)
    }
}
