//! Mode index decoding
//!
//! Each bit of a mode index selects one build option of the decompressor. The
//! two families use different bit layouts:
//!
//! | bit | M0                      | M2                       |
//! |-----|-------------------------|--------------------------|
//! | 0   | C16 mode, no border fx  | C16 mode                 |
//! | 1   | no CRC check            | no CRC check             |
//! | 2   | no color memory clear   | no read buffer           |
//! | 3   | no ROM enable restore   | border effect type (lo)  |
//! | 4   | no CLI                  | border effect type (hi)  |
//! | 5   | run BASIC program       | no blank display         |
//! | 6   | -                       | no zero page save/restore|
//!
//! M0 disables the read buffer only for the exact pattern `bits 0..1 == 2`.

use super::Family;
use super::constants::{
    BORDER_EFFECT_TYPE, NO_BLANK_DISPLAY, NO_BORDER_EFFECT, NO_COLOR_MEMORY_CLEAR, NO_CRC_CHECK,
    NO_READ_BUFFER, NO_ROM_ENABLE_RESTORE, NO_ZP_SAVE_RESTORE, SFX_C16_MODE, SFX_NO_CLI,
    SFX_RUN_BASIC_PROGRAM, SFX_START_ADDRESS_HIGH, SFX_START_ADDRESS_LOW,
};
use super::reader::ModuleLibrary;
use super::template::Placeholder;
use crate::exceptions::{Result, SfxError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Validated mode index within a family's range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ModeIndex {
    family: Family,
    value: u8,
}

impl ModeIndex {
    /// Create a mode index, rejecting values outside the family's range
    pub fn new(family: Family, value: usize) -> Result<Self> {
        if value >= family.mode_count() {
            return Err(SfxError::ConfigurationRange {
                family: family.name(),
                value,
            });
        }
        Ok(ModeIndex {
            family,
            value: value as u8,
        })
    }

    pub fn family(self) -> Family {
        self.family
    }

    pub fn value(self) -> u8 {
        self.value
    }

    /// Header table slot of this mode
    pub fn slot(self) -> usize {
        self.value as usize
    }

    fn is_set(self, mask: u8) -> bool {
        self.value & mask != 0
    }
}

impl fmt::Display for ModeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.family, self.value)
    }
}

impl Family {
    /// Every mode index of the family in ascending order
    pub fn modes(self) -> impl Iterator<Item = ModeIndex> {
        (0..self.mode_count()).map(move |value| ModeIndex {
            family: self,
            value: value as u8,
        })
    }
}

/// Build options of an M0 decompressor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct M0Variant {
    pub c16_mode: bool,
    pub no_crc_check: bool,
    pub no_read_buffer: bool,
    pub no_border_effect: bool,
    pub no_color_memory_clear: bool,
    pub no_rom_enable_restore: bool,
    pub no_cli: bool,
    pub run_basic_program: bool,
}

impl M0Variant {
    fn decode(mode: ModeIndex) -> Self {
        M0Variant {
            c16_mode: mode.is_set(0x01),
            no_crc_check: mode.is_set(0x02),
            no_read_buffer: mode.value & 0x03 == 0x02,
            no_border_effect: mode.is_set(0x01),
            no_color_memory_clear: mode.is_set(0x04),
            no_rom_enable_restore: mode.is_set(0x08),
            no_cli: mode.is_set(0x10),
            run_basic_program: mode.is_set(0x20),
        }
    }

    pub fn start_address(&self) -> u16 {
        if self.c16_mode || self.no_read_buffer {
            SFX_START_ADDRESS_LOW
        } else {
            SFX_START_ADDRESS_HIGH
        }
    }
}

/// Build options of an M2 decompressor
///
/// ROM enable restore and CLI are always skipped and the BASIC program runner
/// is always off in this family; they are not part of the mode index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct M2Variant {
    pub c16_mode: bool,
    pub no_crc_check: bool,
    pub no_read_buffer: bool,
    pub border_effect_type: u8,
    pub no_blank_display: bool,
    pub no_zp_save_restore: bool,
}

impl M2Variant {
    fn decode(mode: ModeIndex) -> Self {
        M2Variant {
            c16_mode: mode.is_set(0x01),
            no_crc_check: mode.is_set(0x02),
            no_read_buffer: mode.is_set(0x04),
            border_effect_type: (mode.value & 0x18) / 8,
            no_blank_display: mode.is_set(0x20),
            no_zp_save_restore: mode.is_set(0x40),
        }
    }

    pub fn start_address(&self) -> u16 {
        if self.c16_mode || self.no_crc_check {
            SFX_START_ADDRESS_LOW
        } else {
            SFX_START_ADDRESS_HIGH
        }
    }

    /// Mode index selecting this exact variant
    pub fn mode_index(&self) -> Result<ModeIndex> {
        if self.border_effect_type > 3 {
            return Err(SfxError::Generic(format!(
                "Border effect type {} does not fit in two bits",
                self.border_effect_type
            )));
        }
        let value = (self.c16_mode as usize)
            | (self.no_crc_check as usize) << 1
            | (self.no_read_buffer as usize) << 2
            | (self.border_effect_type as usize) << 3
            | (self.no_blank_display as usize) << 5
            | (self.no_zp_save_restore as usize) << 6;
        ModeIndex::new(Family::M2, value)
    }
}

/// Where an M0 module continues after decompression
///
/// Loaders pass this as an integer: -1 runs the BASIC program, -3 enters the
/// monitor, any other negative value returns to the READY prompt, and values
/// above $FFFF keep their low 16 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunAddress {
    Basic,
    #[default]
    Ready,
    Monitor,
    Address(u16),
}

impl RunAddress {
    pub const READY_VECTOR: u16 = 0x867E;
    pub const MONITOR_VECTOR: u16 = 0xFF52;

    /// Interpret the loader's integer convention
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            -1 => RunAddress::Basic,
            -3 => RunAddress::Monitor,
            r if r < 0 => RunAddress::Ready,
            r => RunAddress::Address((r & 0xFFFF) as u16),
        }
    }

    pub fn is_basic(self) -> bool {
        self == RunAddress::Basic
    }

    /// Jump address stored in the module; BASIC programs keep the stub's own
    pub fn target(self) -> Option<u16> {
        match self {
            RunAddress::Basic => None,
            RunAddress::Ready => Some(Self::READY_VECTOR),
            RunAddress::Monitor => Some(Self::MONITOR_VECTOR),
            RunAddress::Address(address) => Some(address),
        }
    }
}

impl FromStr for RunAddress {
    type Err = SfxError;

    /// `basic`, `ready`, `monitor`, `$1001`, `0x1001`, `4097` or a raw negative code
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "basic" => return Ok(RunAddress::Basic),
            "ready" => return Ok(RunAddress::Ready),
            "monitor" => return Ok(RunAddress::Monitor),
            _ => {}
        }

        let hex = s
            .strip_prefix('$')
            .or_else(|| s.strip_prefix("0x"))
            .or_else(|| s.strip_prefix("0X"));
        let parsed = match hex {
            Some(digits) => i64::from_str_radix(digits, 16),
            None => s.parse::<i64>(),
        };
        parsed.map(Self::from_raw).map_err(|_| {
            SfxError::Generic(format!(
                "Invalid run address '{s}' (expected basic, ready, monitor or an address)"
            ))
        })
    }
}

/// Store the run address in the last two bytes of an M0 module
pub fn patch_run_address(module: &mut [u8], run_address: RunAddress) -> Result<()> {
    let Some(address) = run_address.target() else {
        return Ok(());
    };
    let len = module.len();
    if len < 2 {
        return Err(SfxError::Format(format!(
            "Module of {len} bytes has no room for a run address"
        )));
    }
    module[len - 2..].copy_from_slice(&address.to_le_bytes());
    Ok(())
}

/// Loader-side options that select an M0 module
///
/// `fast_module` drops the CRC check and `no_cleanup` skips the color memory
/// clear; both shrink the stub. A BASIC run address selects the modules that
/// start the loaded program with RUN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct M0Options {
    pub c16_mode: bool,
    pub fast_module: bool,
    pub no_cleanup: bool,
    pub no_rom: bool,
    pub no_cli: bool,
    pub run_address: RunAddress,
}

impl M0Options {
    pub fn mode_index(&self) -> ModeIndex {
        let value = (self.c16_mode as u8)
            | (self.fast_module as u8) << 1
            | (self.no_cleanup as u8) << 2
            | (self.no_rom as u8) << 3
            | (self.no_cli as u8) << 4
            | (self.run_address.is_basic() as u8) << 5;
        ModeIndex {
            family: Family::M0,
            value,
        }
    }

    /// Copy the selected module out of an M0 library, run address patched in
    pub fn select_module(&self, library: &ModuleLibrary<'_>) -> Result<Vec<u8>> {
        if *library.layout() != Family::M0.layout() {
            return Err(SfxError::Format(
                "Run address patching needs an m0 module library".to_string(),
            ));
        }
        let mut module = library.module(self.mode_index().slot())?.to_vec();
        patch_run_address(&mut module, self.run_address)?;
        Ok(module)
    }
}

/// Decoded configuration of one mode index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum VariantConfig {
    M0(M0Variant),
    M2(M2Variant),
}

// (placeholder, template default) per family, in template order
const M0_PLACEHOLDERS: [(&str, &str); 8] = [
    (SFX_C16_MODE, "0"),
    (NO_CRC_CHECK, "0"),
    (NO_READ_BUFFER, "0"),
    (NO_BORDER_EFFECT, "0"),
    (NO_COLOR_MEMORY_CLEAR, "0"),
    (NO_ROM_ENABLE_RESTORE, "0"),
    (SFX_NO_CLI, "0"),
    (SFX_RUN_BASIC_PROGRAM, "0"),
];

const M2_PLACEHOLDERS: [(&str, &str); 9] = [
    (SFX_C16_MODE, "0"),
    (NO_CRC_CHECK, "0"),
    (NO_READ_BUFFER, "0"),
    (BORDER_EFFECT_TYPE, "2"),
    (NO_BLANK_DISPLAY, "0"),
    (NO_ZP_SAVE_RESTORE, "0"),
    (NO_ROM_ENABLE_RESTORE, "0"),
    (SFX_NO_CLI, "0"),
    (SFX_RUN_BASIC_PROGRAM, "1"),
];

impl VariantConfig {
    /// Decode a mode index; total over the family's range
    pub fn decode(mode: ModeIndex) -> Self {
        match mode.family {
            Family::M0 => VariantConfig::M0(M0Variant::decode(mode)),
            Family::M2 => VariantConfig::M2(M2Variant::decode(mode)),
        }
    }

    pub fn family(&self) -> Family {
        match self {
            VariantConfig::M0(_) => Family::M0,
            VariantConfig::M2(_) => Family::M2,
        }
    }

    /// Address the compiled stub is assembled for
    pub fn start_address(&self) -> u16 {
        match self {
            VariantConfig::M0(v) => v.start_address(),
            VariantConfig::M2(v) => v.start_address(),
        }
    }

    /// Placeholder table with this configuration's values filled in
    pub fn placeholders(&self) -> Vec<Placeholder> {
        match self {
            VariantConfig::M0(v) => fill(
                &M0_PLACEHOLDERS,
                &[
                    v.c16_mode as u8,
                    v.no_crc_check as u8,
                    v.no_read_buffer as u8,
                    v.no_border_effect as u8,
                    v.no_color_memory_clear as u8,
                    v.no_rom_enable_restore as u8,
                    v.no_cli as u8,
                    v.run_basic_program as u8,
                ],
            ),
            VariantConfig::M2(v) => fill(
                &M2_PLACEHOLDERS,
                &[
                    v.c16_mode as u8,
                    v.no_crc_check as u8,
                    v.no_read_buffer as u8,
                    v.border_effect_type,
                    v.no_blank_display as u8,
                    v.no_zp_save_restore as u8,
                    1,
                    1,
                    0,
                ],
            ),
        }
    }
}

fn fill(table: &[(&'static str, &'static str)], values: &[u8]) -> Vec<Placeholder> {
    table
        .iter()
        .zip(values)
        .map(|(&(name, default), value)| Placeholder::new(name, default, value.to_string()))
        .collect()
}
