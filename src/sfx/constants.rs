// Core module library constants that never change
// For tool names and file names, see defaults.rs

// Start addresses of the compiled stubs; the larger builds load 8 bytes higher
pub const SFX_START_ADDRESS_LOW: u16 = 4109; // $100D
pub const SFX_START_ADDRESS_HIGH: u16 = 4117; // $1015

// Header table layout - part of the loader contract
pub const HEADER_ENTRY_SIZE: usize = 4; // offset (u16 LE) + length (u16 LE)
pub const LOAD_ADDRESS_SIZE: usize = 2; // PRG load address prefix (u16 LE)

// Mode ranges
pub const M0_MODE_COUNT: usize = 64;
pub const M2_MODE_COUNT: usize = 128;

// M0 library is loaded at $2000; offsets in its table are absolute addresses
pub const M0_LOAD_ADDRESS: u16 = 0x2000;
pub const M0_BASE_OFFSET: u32 = M0_LOAD_ADDRESS as u32 + (M0_MODE_COUNT * HEADER_ENTRY_SIZE) as u32;

// M2 has no load address; offsets are positions from the start of the blob
pub const M2_BASE_OFFSET: u32 = (M2_MODE_COUNT * HEADER_ENTRY_SIZE) as u32;

// Compressor modes
pub const COMPRESSION_MODE_M0: u8 = 0;
pub const COMPRESSION_MODE_M2: u8 = 2;

// Template placeholder names
pub const SFX_C16_MODE: &str = "SFX_C16_MODE";
pub const NO_CRC_CHECK: &str = "NO_CRC_CHECK";
pub const NO_READ_BUFFER: &str = "NO_READ_BUFFER";
pub const NO_BORDER_EFFECT: &str = "NO_BORDER_EFFECT";
pub const NO_COLOR_MEMORY_CLEAR: &str = "NO_COLOR_MEMORY_CLEAR";
pub const NO_ROM_ENABLE_RESTORE: &str = "NO_ROM_ENABLE_RESTORE";
pub const SFX_NO_CLI: &str = "SFX_NO_CLI";
pub const SFX_RUN_BASIC_PROGRAM: &str = "SFX_RUN_BASIC_PROGRAM";
pub const BORDER_EFFECT_TYPE: &str = "BORDER_EFFECT_TYPE";
pub const NO_BLANK_DISPLAY: &str = "NO_BLANK_DISPLAY";
pub const NO_ZP_SAVE_RESTORE: &str = "NO_ZP_SAVE_RESTORE";

// Assignment rewritten with the computed start address
pub const START_ADDRESS_SYMBOL: &str = "sfxStartAddress";
