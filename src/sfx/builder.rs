//! Module library build pipeline

use super::Family;
use super::packer::{BlobPacker, PackedBlob};
use super::reader::ModuleLibrary;
use super::template::parameterize;
use super::toolchain::{CompressRequest, Compiler, Compressor};
use super::variant::VariantConfig;
use crate::exceptions::{Result, SfxError};
use log::{debug, info, trace};
use std::time::Instant;

/// Packed library and its compressed form
#[derive(Debug)]
pub struct BuildOutcome {
    pub family: Family,
    pub blob: PackedBlob,
    pub artifact: Vec<u8>,
}

/// Compile every mode of `family` from `template` and pack the results
///
/// Modes are processed strictly in order; the first failure aborts the whole
/// library since a partially filled header table is useless to the loader.
pub fn pack_variants<C: Compiler>(
    family: Family,
    template: &str,
    compiler: &mut C,
) -> Result<PackedBlob> {
    info!(
        "🔨 Building {} module library ({} modes)",
        family,
        family.mode_count()
    );
    let mut packer = BlobPacker::for_family(family);

    for mode in family.modes() {
        let config = VariantConfig::decode(mode);
        trace!("🔍 {mode}: {config:?}");

        let in_mode = |e: SfxError| e.for_mode(family.name(), mode.value());
        let module = build_variant(&config, template, compiler).map_err(in_mode)?;
        let entry = packer.push(mode.slot(), &module).map_err(in_mode)?;

        debug!(
            "🧩 {}: start={} offset={:#06x} size={}",
            mode,
            config.start_address(),
            entry.offset,
            module.len()
        );
    }

    let blob = packer.finish()?;
    ModuleLibrary::parse(blob.as_bytes(), *blob.layout())?.verify()?;
    Ok(blob)
}

fn build_variant<C: Compiler>(
    config: &VariantConfig,
    template: &str,
    compiler: &mut C,
) -> Result<Vec<u8>> {
    let source = parameterize(template, &config.placeholders(), config.start_address())?;
    compiler.compile(&source, config.family().assembler_target())
}

/// Pack every variant of `family` and compress the result
pub fn build_library<C: Compiler, Z: Compressor>(
    family: Family,
    template: &str,
    compiler: &mut C,
    compressor: &mut Z,
    effort_level: u8,
) -> Result<BuildOutcome> {
    let timer = Instant::now();
    let blob = pack_variants(family, template, compiler)?;

    let request = CompressRequest::for_family(family, effort_level);
    let artifact = compressor.compress(blob.as_bytes(), &request)?;

    info!(
        "✅ {} library: {} bytes packed, {} bytes compressed in {:?}",
        family,
        blob.len(),
        artifact.len(),
        timer.elapsed()
    );

    Ok(BuildOutcome {
        family,
        blob,
        artifact,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::sfx::variant::ModeIndex;

    pub(crate) const M0_TEMPLATE: &str = "\
; M0 self-extractor
.define SFX_C16_MODE 0
.define NO_CRC_CHECK 0
.define NO_READ_BUFFER 0
.define NO_BORDER_EFFECT 0
.define NO_COLOR_MEMORY_CLEAR 0
.define NO_ROM_ENABLE_RESTORE 0
.define SFX_NO_CLI 0
.define SFX_RUN_BASIC_PROGRAM 0

sfxStartAddress = $1015

        .org sfxStartAddress
        sei
";

    pub(crate) const M2_TEMPLATE: &str = "\
.define SFX_C16_MODE 0
.define NO_CRC_CHECK 0
.define NO_READ_BUFFER 0
.define BORDER_EFFECT_TYPE 2
.define NO_BLANK_DISPLAY 0
.define NO_ZP_SAVE_RESTORE 0
.define NO_ROM_ENABLE_RESTORE 0
.define SFX_NO_CLI 0
.define SFX_RUN_BASIC_PROGRAM 1
sfxStartAddress = 0
";

    /// "Assembles" a template into its define values followed by the start address
    #[derive(Debug, Default)]
    pub(crate) struct FakeCompiler {
        pub(crate) targets: Vec<String>,
        pub(crate) fail_on_call: Option<usize>,
    }

    impl Compiler for FakeCompiler {
        fn compile(&mut self, source: &str, target: &str) -> Result<Vec<u8>> {
            if self.fail_on_call == Some(self.targets.len()) {
                return Err(SfxError::ExternalTool {
                    tool: "ld65".to_string(),
                    detail: "exit status: 1".to_string(),
                });
            }
            self.targets.push(target.to_string());

            let mut out = Vec::new();
            for line in source.lines() {
                let mut tokens = line.split_whitespace();
                match tokens.next() {
                    Some(".define") => {
                        let value = tokens.nth(1).unwrap_or("255");
                        out.push(value.parse::<u8>().unwrap_or(255));
                    }
                    Some("sfxStartAddress") => {
                        let value = tokens.nth(1).unwrap_or("0");
                        let address = value.parse::<u16>().unwrap_or(0);
                        out.extend_from_slice(&address.to_le_bytes());
                    }
                    _ => {}
                }
            }
            Ok(out)
        }
    }

    #[derive(Debug, Default)]
    pub(crate) struct FakeCompressor {
        pub(crate) requests: Vec<CompressRequest>,
    }

    impl Compressor for FakeCompressor {
        fn compress(&mut self, blob: &[u8], request: &CompressRequest) -> Result<Vec<u8>> {
            self.requests.push(*request);
            Ok(blob.iter().rev().copied().collect())
        }
    }

    fn expected_module(mode: ModeIndex) -> Vec<u8> {
        let config = VariantConfig::decode(mode);
        let mut bytes: Vec<u8> = config
            .placeholders()
            .iter()
            .map(|p| p.value.parse::<u8>().unwrap())
            .collect();
        bytes.extend_from_slice(&config.start_address().to_le_bytes());
        bytes
    }

    #[test]
    fn test_m0_library_end_to_end() {
        let mut compiler = FakeCompiler::default();
        let mut compressor = FakeCompressor::default();
        let outcome =
            build_library(Family::M0, M0_TEMPLATE, &mut compiler, &mut compressor, 9).unwrap();

        assert_eq!(compiler.targets.len(), 64);
        assert!(compiler.targets.iter().all(|t| t == "plus4"));
        assert_eq!(
            compressor.requests,
            vec![CompressRequest {
                mode: 0,
                load_address: Some(0x2000),
                effort_level: 9,
            }]
        );

        let bytes = outcome.blob.as_bytes();
        assert_eq!(&bytes[..2], &[0x00, 0x20]);
        // Every module is 8 flags plus a 2-byte start address
        assert_eq!(bytes.len(), 2 + 256 + 64 * 10);
        assert_eq!(outcome.artifact.len(), bytes.len());

        let library = ModuleLibrary::parse_family(bytes, Family::M0).unwrap();
        for mode in Family::M0.modes() {
            assert_eq!(library.module(mode.slot()).unwrap(), expected_module(mode));
        }
        assert_eq!(library.entries()[0].offset, 0x2100);
    }

    #[test]
    fn test_m2_library_end_to_end() {
        let mut compiler = FakeCompiler::default();
        let blob = pack_variants(Family::M2, M2_TEMPLATE, &mut compiler).unwrap();

        assert!(compiler.targets.iter().all(|t| t == "none"));
        assert_eq!(blob.len(), 512 + 128 * 11);

        let library = ModuleLibrary::parse_family(blob.as_bytes(), Family::M2).unwrap();
        let mode = ModeIndex::new(Family::M2, 0b0011001).unwrap();
        // c16, border type 3, forced ROM/CLI on, BASIC off, low start address
        assert_eq!(
            library.module(mode.slot()).unwrap(),
            [1, 0, 0, 3, 0, 0, 1, 1, 0, 0x0D, 0x10]
        );
    }

    #[test]
    fn test_compile_failure_names_mode() {
        let mut compiler = FakeCompiler {
            fail_on_call: Some(5),
            ..FakeCompiler::default()
        };
        let mut compressor = FakeCompressor::default();
        let err = build_library(Family::M0, M0_TEMPLATE, &mut compiler, &mut compressor, 9)
            .unwrap_err();
        assert_eq!(err.to_string(), "Mode m0/5: External tool ld65: exit status: 1");
        assert!(compressor.requests.is_empty());
    }

    #[test]
    fn test_template_defect_aborts_before_compiling() {
        let template = M0_TEMPLATE.replace(".define NO_COLOR_MEMORY_CLEAR 0\n", "");
        let mut compiler = FakeCompiler::default();
        let err = pack_variants(Family::M0, &template, &mut compiler).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            SfxError::TemplateMismatch(msg) if msg == "NO_COLOR_MEMORY_CLEAR not found"
        ));
        assert!(err.to_string().starts_with("Mode m0/0:"));
        assert!(compiler.targets.is_empty());
    }

    #[test]
    fn test_m0_template_does_not_fit_m2() {
        let mut compiler = FakeCompiler::default();
        let err = pack_variants(Family::M2, M0_TEMPLATE, &mut compiler).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("BORDER_EFFECT_TYPE not found"), "{msg}");
        assert!(msg.contains("SFX_RUN_BASIC_PROGRAM has value '0'"), "{msg}");
    }
}
