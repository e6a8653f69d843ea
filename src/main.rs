use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use clap_stdin::FileOrStdin;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use emjc::backend::{Backend, ObjectBackend};
use emjc::error::CompileError;
use emjc::ir::{Interpreter, DEFAULT_STEP_LIMIT};
use emjc::visualize::TreeVisualizer;

/// Compiler for .emj programs
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Source file, or `-` for stdin
    source: FileOrStdin,

    /// Object file to write
    #[arg(default_value = "program.o")]
    output: PathBuf,

    /// Print the syntax tree as a Graphviz graph
    #[arg(long)]
    dump_ast: bool,

    /// Print the generated IR
    #[arg(long)]
    emit_ir: bool,

    /// Interpret the program instead of writing an object file
    #[arg(long)]
    run: bool,

    /// Instruction limit for --run
    #[arg(long, default_value_t = DEFAULT_STEP_LIMIT)]
    max_steps: usize,

    /// Log phase progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "emjc=debug" } else { "emjc=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))
}

fn report(err: &CompileError) {
    for line in err.diagnostics() {
        eprintln!("{}", line);
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let source = cli
        .source
        .contents()
        .context("Could not open source file")?;

    let program = match emjc::parser::parse_source(&source) {
        Ok(program) => program,
        Err(e) => {
            report(&e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.dump_ast {
        TreeVisualizer::new().write_to(&program, io::stdout())?;
    }

    let module = match emjc::compile_ast(&program) {
        Ok(module) => module,
        Err(e) => {
            report(&e);
            return Ok(ExitCode::FAILURE);
        }
    };

    if cli.emit_ir {
        print!("{}", module);
    }

    if cli.run {
        let code = Interpreter::new(&module)
            .with_step_limit(cli.max_steps)
            .run(&mut io::stdout().lock())?;
        return Ok(ExitCode::from(code as u8));
    }

    let backend = ObjectBackend::new()?;
    backend
        .emit_to_file(&module, &cli.output)
        .with_context(|| format!("Could not write {}", cli.output.display()))?;

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("{:#}", e);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
