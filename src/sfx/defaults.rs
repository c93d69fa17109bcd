// Default tool names, file names and environment overrides

// =================================
// External tools
// =================================
pub const DEFAULT_ASSEMBLER: &str = "ca65";
pub const DEFAULT_LINKER: &str = "ld65";
pub const DEFAULT_COMPRESSOR: &str = "p4compress";

pub const ENV_ASSEMBLER: &str = "SFXLIB_CA65";
pub const ENV_LINKER: &str = "SFXLIB_LD65";
pub const ENV_COMPRESSOR: &str = "SFXLIB_COMPRESSOR";
pub const ENV_WORK_DIR: &str = "SFXLIB_WORK_DIR";

// =================================
// Assembler targets
// =================================
pub const M0_ASSEMBLER_TARGET: &str = "plus4";
pub const M2_ASSEMBLER_TARGET: &str = "none";

// =================================
// Templates and artifacts
// =================================
pub const M0_TEMPLATE_FILE: &str = "decompress0_sfx.s";
pub const M2_TEMPLATE_FILE: &str = "decompress2_sfx.s";
pub const M0_ARTIFACT_FILE: &str = "sfxdecomp0.prg";
pub const M2_ARTIFACT_FILE: &str = "sfxdecomp2.bin";
pub const RAW_BLOB_SUFFIX: &str = "raw";
pub const REPORT_SUFFIX: &str = "json";

// =================================
// Compression
// =================================
pub const DEFAULT_EFFORT_LEVEL: u8 = 9;
pub const MIN_EFFORT_LEVEL: u8 = 1;
pub const MAX_EFFORT_LEVEL: u8 = 9;

// Prefix of the private temporary directory used for tool invocations
pub const TEMP_DIR_PREFIX: &str = "sfxlib-";
