//! brainfly command-line driver.
//!
//! Usage:
//!   brainfly build <file> [--out-dir DIR] [--object]
//!   brainfly run <memory_size> <file>
//!   brainfly bundle <file> [--output FILE] [--memory-size N]
//!   brainfly disasm <file>
//!
//! `RUST_LOG=debug` shows what each compilation stage did.

use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::thread;

use brainfly::artifact::{self, COMPRESSED_EXTENSION, TEXT_EXTENSION};
use brainfly::{bundle, compile, x64, Executable};

/// Tapes smaller than this are rounded up.
const MIN_MEMORY_SIZE: usize = 128;

/// Binding and evaluating a chain recurse once per node, so every command
/// runs on a worker with a deep stack.
const WORKER_STACK_SIZE: usize = 512 * 1024 * 1024;

type CliResult = Result<i32, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "brainfly", version)]
#[command(about = "Ahead-of-time compiler for the eight-instruction tape language")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a source file into .bft (canonical text) and .bfo (compressed) artifacts
    Build {
        file: PathBuf,

        /// Directory to write artifacts to (defaults to the current directory)
        #[arg(long = "out-dir")]
        out_dir: Option<PathBuf>,

        /// Also write a native x86-64 ELF object (.o)
        #[arg(long)]
        object: bool,
    },
    /// Run a source file or a .bfo artifact on stdin/stdout
    Run {
        memory_size: usize,
        file: PathBuf,
    },
    /// Write a standalone Rust source file for a program
    Bundle {
        file: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long = "memory-size", default_value_t = 30000)]
        memory_size: usize,
    },
    /// Print the native x86-64 lowering of a program
    Disasm {
        file: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let worker = thread::Builder::new()
        .name("brainfly".to_string())
        .stack_size(WORKER_STACK_SIZE)
        .spawn(move || dispatch(cli.command));

    let result = match worker {
        Ok(handle) => handle
            .join()
            .unwrap_or_else(|_| Err("aborted by a panic on the worker thread".into())),
        Err(e) => Err(e.into()),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

fn dispatch(command: Commands) -> CliResult {
    match command {
        Commands::Build { file, out_dir, object } => build(&file, out_dir.as_deref(), object),
        Commands::Run { memory_size, file } => run(memory_size, &file),
        Commands::Bundle { file, output, memory_size } => write_bundle(&file, output, memory_size),
        Commands::Disasm { file } => disasm(&file),
    }
}

/// Load a program, reloading `.bfo` artifacts and compiling anything else.
fn load(path: &Path) -> Result<Executable, Box<dyn Error + Send + Sync>> {
    if artifact::is_compressed_artifact(path) {
        let bytes = fs::read(path)?;
        Ok(Executable::new(artifact::decode(&bytes)?))
    } else {
        let source = fs::read_to_string(path)?;
        Ok(compile(&source)?)
    }
}

fn output_path(source: &Path, out_dir: Option<&Path>, extension: &str) -> PathBuf {
    let stem = source.file_stem().unwrap_or(source.as_os_str());
    out_dir.unwrap_or(Path::new(".")).join(stem).with_extension(extension)
}

fn build(file: &Path, out_dir: Option<&Path>, object: bool) -> CliResult {
    let exe = load(file)?;
    if let Some(dir) = out_dir {
        fs::create_dir_all(dir)?;
    }

    let text_path = output_path(file, out_dir, TEXT_EXTENSION);
    fs::write(&text_path, exe.to_string())?;
    info!("Wrote {}", text_path.display());

    let artifact_path = output_path(file, out_dir, COMPRESSED_EXTENSION);
    fs::write(&artifact_path, artifact::encode(exe.chain())?)?;
    info!("Wrote {}", artifact_path.display());

    if object {
        let object_path = output_path(file, out_dir, "o");
        fs::write(&object_path, x64::lower(exe.chain())?.to_object()?)?;
        info!("Wrote {}", object_path.display());
    }
    Ok(0)
}

fn run(memory_size: usize, file: &Path) -> CliResult {
    let exe = load(file)?;
    let mut tape = vec![0u8; memory_size.max(MIN_MEMORY_SIZE)];
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut input = stdin.lock();
    let mut output = io::BufWriter::new(stdout.lock());
    let pointer = exe.run(&mut tape, &mut input, &mut output)?;
    output.flush()?;
    Ok(pointer)
}

fn write_bundle(file: &Path, output: Option<PathBuf>, memory_size: usize) -> CliResult {
    let exe = load(file)?;
    let path = output.unwrap_or_else(|| output_path(file, None, "rs"));
    fs::write(&path, bundle::render(exe.chain(), memory_size.max(MIN_MEMORY_SIZE)))?;
    info!("Wrote {}", path.display());
    Ok(0)
}

fn disasm(file: &Path) -> CliResult {
    let exe = load(file)?;
    let code = x64::lower(exe.chain())?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(code.disassemble().as_bytes())?;
    stdout.flush()?;
    Ok(0)
}
