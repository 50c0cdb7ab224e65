// footprint: cycle-safe deep size measurement for heap scripts

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use footprint::interpreter::constants::{DEFAULT_HEAP_LIMIT, DEFAULT_SNAPSHOT_LIMIT};
use footprint::interpreter::engine::Interpreter;
use footprint::interpreter::errors::RuntimeError;
use footprint::script::parser::Parser;
use footprint::ui::App;

/// Step through a heap script and watch what its objects really cost.
#[derive(Debug, ClapParser)]
#[command(name = "footprint", version, about)]
struct Cli {
    /// Heap script to execute
    file: PathBuf,

    /// Print the output and every footprint breakdown instead of starting the TUI
    #[arg(long)]
    report: bool,

    /// Snapshot history limit in MiB
    #[arg(long, value_name = "MB", default_value_t = DEFAULT_SNAPSHOT_LIMIT / (1024 * 1024))]
    snapshot_limit_mb: usize,

    /// Heap limit in KiB
    #[arg(long, value_name = "KB", default_value_t = DEFAULT_HEAP_LIMIT / 1024)]
    heap_limit_kb: usize,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let source = fs::read_to_string(&cli.file)
        .with_context(|| format!("failed to read '{}'", cli.file.display()))?;

    let program = match Parser::new(&source).and_then(|mut parser| parser.parse_program()) {
        Ok(program) => program,
        Err(e) => {
            eprintln!("{}: {}", cli.file.display(), e);
            return Ok(ExitCode::FAILURE);
        }
    };
    log::info!(
        "parsed {} statement(s) from {}",
        program.statements.len(),
        cli.file.display()
    );

    let mut interpreter = Interpreter::with_heap_limit(
        program,
        cli.snapshot_limit_mb.saturating_mul(1024 * 1024),
        cli.heap_limit_kb.saturating_mul(1024),
    );
    let error = interpreter.run().err();

    if cli.report {
        print_report(&interpreter, error.as_ref());
        return Ok(if error.is_some() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        });
    }

    if let Some(e) = &error {
        eprintln!("Runtime error: {}", e);
        eprintln!("Entering TUI with partial execution history...");
    }

    // The TUI starts at the beginning of history
    if let Err(e) = interpreter.rewind_to_start() {
        log::warn!("failed to rewind to start: {}", e);
    }

    run_tui(App::new(interpreter, source, error))?;
    Ok(ExitCode::SUCCESS)
}

/// Non-interactive mode: output, then one breakdown per footprint
fn print_report(interpreter: &Interpreter, error: Option<&RuntimeError>) {
    for line in interpreter.transcript().get_output() {
        println!("{}", line);
    }

    for measurement in interpreter.reports() {
        println!();
        println!("== footprint at line {} ==", measurement.location.line);
        for line in measurement.render_lines() {
            println!("{}", line);
        }
    }

    if let Some(e) = error {
        eprintln!("Runtime error: {}", e);
    }
}

fn run_tui(mut app: App) -> Result<()> {
    with_terminal(
        || enable_raw_mode().context("failed to enable raw mode"),
        || {
            let mut stdout = io::stdout();
            execute!(stdout, EnterAlternateScreen)?;
            let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
            app.run(&mut terminal).context("TUI event loop failed")
        },
        || {
            disable_raw_mode()?;
            execute!(io::stdout(), LeaveAlternateScreen, cursor::Show)?;
            Ok(())
        },
    )
}

/// Run `body` inside a terminal session. Once `enter` succeeded, `leave` runs
/// no matter where `body` failed.
fn with_terminal<T>(
    enter: impl FnOnce() -> Result<()>,
    body: impl FnOnce() -> Result<T>,
    leave: impl FnOnce() -> Result<()>,
) -> Result<T> {
    enter()?;
    let result = body();
    let restored = leave();
    let value = result?;
    restored?;
    Ok(value)
}
