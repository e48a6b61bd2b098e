//! Thin command-line front-end for the interpreter.
//!
//! Loads the entrypoint assembly, registers a directory-scanning assembly
//! loader, and runs the program. All interpreter behavior lives in the
//! library; this binary only wires I/O and diagnostics.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use walkdir::WalkDir;

use cilrun::{metadata::assembly::Assembly, runtime::Runtime};

/// Execute a CLI (.NET) assembly.
#[derive(Debug, Parser)]
#[command(name = "cilrun", version, about)]
struct Args {
    /// Folder scanned for assemblies referenced by the program.
    /// Defaults to the entrypoint's folder.
    #[arg(short, long, value_name = "FOLDER")]
    assemblies: Option<PathBuf>,

    /// Print assembly information instead of executing.
    #[arg(long)]
    info: bool,

    /// Enable per-instruction trace output.
    #[arg(short, long)]
    verbose: bool,

    /// The assembly to execute.
    #[arg(value_name = "DLL")]
    entrypoint: PathBuf,
}

/// Find an assembly by stem name under `base`, e.g. `B` -> `base/B.dll`.
fn find_assembly(base: &Path, name: &str) -> Option<Assembly> {
    for entry in WalkDir::new(base).into_iter().filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.file_stem().and_then(|stem| stem.to_str()) == Some(name) {
            match Assembly::from_file(path) {
                Ok(assembly) => return Some(assembly),
                Err(error) => {
                    log::warn!("skipping '{}': {}", path.display(), error);
                }
            }
        }
    }

    None
}

fn print_info(assembly: &Assembly) {
    println!("module:      {}", assembly.name());
    println!("metadata:    {}", assembly.version());
    println!("entry point: {}", assembly.entry_point());

    if let Ok(mvid) = assembly.mvid() {
        let hex: String = mvid.iter().map(|byte| format!("{byte:02x}")).collect();
        println!("mvid:        {hex}");
    }

    println!("tables:");
    for (id, count) in assembly.table_counts() {
        println!("  {id:?}: {count} rows");
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Diagnostics go to stdout: method entries at debug, opcodes at trace
    env_logger::Builder::new()
        .filter_level(if args.verbose {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Debug
        })
        .parse_default_env()
        .target(env_logger::Target::Stdout)
        .format_timestamp(None)
        .format_target(false)
        .init();

    let assembly = Assembly::from_file(&args.entrypoint)
        .with_context(|| format!("loading '{}'", args.entrypoint.display()))?;

    if args.info {
        print_info(&assembly);
        return Ok(ExitCode::SUCCESS);
    }

    let search_path = match args.assemblies {
        Some(path) => path,
        None => args
            .entrypoint
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let mut runtime = Runtime::new();
    runtime.add_assembly_loader(move |name| find_assembly(&search_path, name));

    let exit_code = runtime.run(assembly).context("execution failed")?;

    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    Ok(ExitCode::from(exit_code as u8))
}
