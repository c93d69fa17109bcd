//! Module library builder binary

use clap::{Parser, ValueEnum};
use sfxlib::exit_codes::{EXIT_PANIC, EXIT_SUCCESS, exit_code_for};
use sfxlib::sfx::defaults::{DEFAULT_EFFORT_LEVEL, ENV_WORK_DIR};
use sfxlib::{BuildOptions, Family, build_families};
use std::{env, panic, path::PathBuf, process};

const VERSION: &str = sfxlib::version::VERSION;

#[derive(ValueEnum, Clone, Copy, Debug)]
enum FamilyArg {
    /// Mode 0 decompressors (sfxdecomp0.prg)
    M0,
    /// Mode 2 decompressors (sfxdecomp2.bin)
    M2,
    /// Both libraries, m0 first
    All,
}

impl FamilyArg {
    fn families(self) -> Vec<Family> {
        match self {
            FamilyArg::M0 => vec![Family::M0],
            FamilyArg::M2 => vec![Family::M2],
            FamilyArg::All => Family::ALL.to_vec(),
        }
    }
}

#[derive(Parser, Debug)]
#[command(version = VERSION, about = "Build self-extractor decompressor module libraries")]
struct Args {
    /// Library to build
    #[arg(short, long, value_enum, default_value = "all")]
    family: FamilyArg,

    /// Directory holding decompress0_sfx.s and decompress2_sfx.s
    #[arg(short, long, default_value = ".")]
    template_dir: PathBuf,

    /// Directory receiving the compressed libraries
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Compressor effort level
    #[arg(short, long, default_value_t = DEFAULT_EFFORT_LEVEL,
          value_parser = clap::value_parser!(u8).range(1..=9))]
    level: u8,

    /// Keep tool scratch files in this directory (defaults to $SFXLIB_WORK_DIR or a temporary one)
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Also write the uncompressed library next to the artifact (.raw)
    #[arg(long)]
    blob_output: bool,

    /// Also write a JSON build report next to the artifact (.json)
    #[arg(long)]
    report: bool,

    /// Log level (trace, debug, info, warn, error; prefix with json: for JSON lines)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() {
    // Set up panic handler to return specific exit code
    panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        process::exit(EXIT_PANIC);
    }));

    let result = panic::catch_unwind(run);

    match result {
        Ok(exit_code) => process::exit(exit_code),
        Err(_) => {
            eprintln!("Fatal: Unhandled panic in builder");
            process::exit(EXIT_PANIC);
        }
    }
}

fn run() -> i32 {
    // Handle --version before clap
    if env::args().nth(1).as_deref() == Some("--version") {
        println!("sfxlib-builder {}", sfxlib::version::full_version());
        return EXIT_SUCCESS;
    }

    let args = Args::parse();

    if let Some(ref level) = args.log_level {
        sfxlib::logger::JsonLogger::init_with_level(level);
    } else {
        sfxlib::logger::JsonLogger::init();
    }

    let options = BuildOptions {
        template_dir: args.template_dir,
        output_dir: args.output_dir,
        effort_level: args.level,
        work_dir: args
            .work_dir
            .or_else(|| env::var_os(ENV_WORK_DIR).map(PathBuf::from)),
        write_blob: args.blob_output,
        write_report: args.report,
    };

    match build_families(&args.family.families(), &options) {
        Ok(reports) => {
            for report in &reports {
                log::info!(
                    "✅ {}: {} modules, {} code bytes, {} compressed bytes",
                    report.family,
                    report.mode_count,
                    report.code_size(),
                    report.artifact_size
                );
            }
            EXIT_SUCCESS
        }
        Err(e) => {
            log::error!("❌ Build failed: {}", e);
            eprintln!("Build error: {}", e);
            exit_code_for(&e)
        }
    }
}
