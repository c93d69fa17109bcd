//! Module library inspector binary
//!
//! Works on the uncompressed library (`--blob-output` of the builder).

use clap::Parser;
use sfxlib::exit_codes::{EXIT_FORMAT_ERROR, EXIT_PANIC, EXIT_SUCCESS, exit_code_for};
use sfxlib::sfx::RunAddress;
use sfxlib::{Family, extract_module, inspect_library};
use std::{env, panic, path::PathBuf, process};

const VERSION: &str = sfxlib::version::VERSION;

#[derive(Parser, Debug)]
#[command(version = VERSION, about = "Inspect an uncompressed decompressor module library")]
struct Args {
    /// Library family (m0 or m2)
    #[arg(short, long)]
    family: Family,

    /// Uncompressed library file
    library: PathBuf,

    /// Show or extract a single mode
    #[arg(short, long)]
    mode: Option<usize>,

    /// Write the selected module to this file (requires --mode)
    #[arg(short, long, requires = "mode")]
    extract: Option<PathBuf>,

    /// Patch an extracted m0 module to continue at this address
    /// (basic, ready, monitor, $XXXX, or the loader's -1/-2/-3 codes)
    #[arg(short, long, requires = "extract", allow_hyphen_values = true)]
    run_address: Option<RunAddress>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

fn main() {
    panic::set_hook(Box::new(|panic_info| {
        eprintln!("PANIC: {}", panic_info);
        process::exit(EXIT_PANIC);
    }));

    match panic::catch_unwind(run) {
        Ok(exit_code) => process::exit(exit_code),
        Err(_) => {
            eprintln!("Fatal: Unhandled panic in inspector");
            process::exit(EXIT_PANIC);
        }
    }
}

fn run() -> i32 {
    if env::args().nth(1).as_deref() == Some("--version") {
        println!("sfxlib-inspect {}", sfxlib::version::full_version());
        return EXIT_SUCCESS;
    }

    let args = Args::parse();
    sfxlib::logger::JsonLogger::init_with_level(args.log_level.as_deref().unwrap_or("warn"));

    if let (Some(mode), Some(output)) = (args.mode, &args.extract) {
        let extracted = extract_module(&args.library, args.family, mode, args.run_address, output);
        return match extracted {
            Ok(size) => {
                println!(
                    "{}/{}: {} bytes -> {}",
                    args.family,
                    mode,
                    size,
                    output.display()
                );
                EXIT_SUCCESS
            }
            Err(e) => {
                eprintln!("Extract error: {}", e);
                exit_code_for(&e)
            }
        };
    }

    let summary = match inspect_library(&args.library, args.family) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Inspect error: {}", e);
            return exit_code_for(&e);
        }
    };

    if args.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("JSON error: {}", e);
                return exit_code_for(&e.into());
            }
        }
    } else {
        println!("📋 {} ({} library)", summary.path.display(), summary.family);
        println!("   Size:         {} bytes", summary.size);
        if let Some(address) = summary.load_address {
            println!("   Load address: ${address:04X}");
        }
        println!("   Data region:  {} bytes", summary.data_size);
        println!(
            "   Verified:     {}",
            if summary.verified { "✅ yes" } else { "❌ no" }
        );

        let selected = summary
            .modules
            .iter()
            .filter(|m| args.mode.is_none_or(|mode| usize::from(m.mode) == mode));
        for module in selected {
            println!(
                "   {:>3}  ${:04X}  {:>5} bytes  start {}  {}",
                module.mode, module.offset, module.length, module.start_address, module.checksum
            );
        }
    }

    if summary.verified {
        EXIT_SUCCESS
    } else {
        EXIT_FORMAT_ERROR
    }
}
