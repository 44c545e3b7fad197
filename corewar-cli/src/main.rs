//! Thin command line front end over the `corewar`/`casm` libraries: parse
//! flags into a [`MatchConfig`]/[`TournamentConfig`], assemble each input
//! file with `casm::assemble`, and hand the result straight to `corewar`.
//! No VM logic lives here.

use clap::{Parser, Subcommand};
use corewar::config::{MatchConfig, TournamentConfig};
use corewar::listener::{MatchListener, NullListener};
use corewar::match_controller::{Match, MatchOutcome};
use corewar::tournament::Tournament;
use corewar::{Address, CompiledProgram, ProgramId, ThreadId};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "corewar",
    about = "Core Wars virtual machine command line front end",
    infer_subcommands = true
)]
struct Cli {
    /// Emit a tracing event for every instruction fetch and memory access.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser, Clone)]
struct MatchArgs {
    /// Memory size, in cells.
    #[arg(long = "size")]
    size: Option<usize>,
    /// Maximum number of live threads across the whole match.
    #[arg(long = "threads")]
    threads: Option<usize>,
    /// Cycle budget before the match is declared over.
    #[arg(long = "cycles")]
    cycles: Option<u64>,
    /// Maximum instructions a single program may compile to.
    #[arg(long = "length")]
    length: Option<usize>,
    /// Minimum distance kept between any two programs' start addresses.
    #[arg(long = "distance")]
    distance: Option<usize>,
}

impl MatchArgs {
    fn into_config(self) -> MatchConfig {
        let mut config = MatchConfig::new();
        if let Some(size) = self.size {
            config.memory_size = size;
        }
        if let Some(threads) = self.threads {
            config.max_threads = threads;
        }
        if let Some(cycles) = self.cycles {
            config.cycles_to_completion = cycles;
        }
        if let Some(length) = self.length {
            config.max_program_length = length;
        }
        if let Some(distance) = self.distance {
            config.min_program_distance = distance;
        }
        config
    }
}

#[derive(Subcommand)]
enum Command {
    /// Assembles every file and reports compile errors; runs nothing.
    Verify { files: Vec<PathBuf> },
    /// Assembles and runs one match, tracing every lifecycle event.
    Debug {
        files: Vec<PathBuf>,
        #[command(flatten)]
        match_args: MatchArgs,
    },
    /// Assembles and runs one match, printing only the final outcome.
    Run {
        files: Vec<PathBuf>,
        #[command(flatten)]
        match_args: MatchArgs,
    },
    /// Runs a round-robin tournament over every file in the pool.
    Tournament {
        files: Vec<PathBuf>,
        #[command(flatten)]
        match_args: MatchArgs,
        /// How many programs compete in each match.
        #[arg(long = "viruses")]
        viruses: Option<usize>,
        /// How many times each matchup is replayed.
        #[arg(long = "rounds")]
        rounds: Option<u32>,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{count} compile error(s) in {source_name}")]
    Compile { count: usize, source_name: String },
    #[error(transparent)]
    Core(#[from] corewar::error::CoreError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Verify { files } => verify(&files),
        Command::Debug { files, match_args } => {
            let programs = assemble_all(&files)?;
            let report = Match::new(match_args.into_config()).run(programs, Box::new(TracingListener))?;
            print_outcome(&report.outcome, report.cycles_run);
            Ok(())
        }
        Command::Run { files, match_args } => {
            let programs = assemble_all(&files)?;
            let report = Match::new(match_args.into_config()).run(programs, Box::new(NullListener))?;
            print_outcome(&report.outcome, report.cycles_run);
            Ok(())
        }
        Command::Tournament {
            files,
            match_args,
            viruses,
            rounds,
        } => {
            let pool = assemble_all(&files)?;
            let mut tournament_config = TournamentConfig {
                match_config: match_args.into_config(),
                ..TournamentConfig::default()
            };
            if let Some(viruses) = viruses {
                tournament_config.viruses_per_match = viruses;
            }
            if let Some(rounds) = rounds {
                tournament_config.rounds_per_setup = rounds;
            }

            let report = Tournament::new(tournament_config).run(pool)?;
            println!("{:>24}  wins  ties  losses  points", "program");
            for standing in &report.standings {
                println!(
                    "{:>24}  {:>4}  {:>4}  {:>6}  {:>6}",
                    standing.name, standing.wins, standing.ties, standing.losses, standing.points
                );
            }
            Ok(())
        }
    }
}

fn verify(files: &[PathBuf]) -> Result<(), CliError> {
    let mut total_errors = 0;
    for path in files {
        let source = read(path)?;
        let name = program_name(path);
        let (_program, report) = casm::assemble(&source, &name);
        for error in &report.errors {
            eprintln!("{}", error);
        }
        println!("{}: {} error(s), {} warning(s)", name, report.error_count(), report.warning_count());
        total_errors += report.error_count();
    }
    if total_errors > 0 {
        Err(CliError::Compile {
            count: total_errors,
            source_name: "verify".to_string(),
        })
    } else {
        Ok(())
    }
}

fn assemble_all(files: &[PathBuf]) -> Result<Vec<CompiledProgram>, CliError> {
    files.iter().map(assemble_one).collect()
}

fn assemble_one(path: &PathBuf) -> Result<CompiledProgram, CliError> {
    let source = read(path)?;
    let name = program_name(path);
    let (program, report) = casm::assemble(&source, &name);
    if report.has_errors() {
        for error in &report.errors {
            eprintln!("{}", error);
        }
        return Err(CliError::Compile {
            count: report.error_count(),
            source_name: name,
        });
    }
    Ok(program)
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn program_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_outcome(outcome: &MatchOutcome, cycles_run: u64) {
    match outcome {
        MatchOutcome::Winner(id) => println!("winner: program {} (after {} cycles)", id, cycles_run),
        MatchOutcome::Tie(ids) => println!("tie among programs {:?} (after {} cycles)", ids, cycles_run),
        MatchOutcome::NoSurvivors => println!("no survivors (after {} cycles)", cycles_run),
    }
}

/// Prints every match lifecycle event as it happens; attached in `debug`
/// mode only, since `on_mem_read`/`on_mem_write`/`on_fetch_instruction`
/// fire once per instruction and would drown out `run`'s single-line
/// summary.
struct TracingListener;

impl MatchListener for TracingListener {
    fn on_program_added(&mut self, program: ProgramId, name: &str) {
        println!("program {} added: {}", program, name);
    }

    fn on_execution_started(&mut self, _memory_snapshot: &[u32]) {
        println!("execution started");
    }

    fn on_execution_completed(&mut self) {
        println!("execution completed");
    }

    fn on_thread_created(&mut self, program: ProgramId, thread: ThreadId) {
        println!("program {} created thread {}", program, thread);
    }

    fn on_thread_create_failed(&mut self, program: ProgramId) {
        println!("program {} denied a new thread: budget exhausted", program);
    }

    fn on_thread_terminated(&mut self, program: ProgramId, thread: ThreadId) {
        println!("program {} lost thread {}", program, thread);
    }

    fn on_mem_read(&mut self, program: ProgramId, thread: ThreadId, addr: Address) {
        println!("program {} thread {} read @{}", program, thread, addr);
    }

    fn on_mem_write(&mut self, program: ProgramId, thread: ThreadId, addr: Address) {
        println!("program {} thread {} wrote @{}", program, thread, addr);
    }

    fn on_fetch_instruction(&mut self, program: ProgramId, thread: ThreadId, addr: Address) {
        println!("program {} thread {} fetched @{}", program, thread, addr);
    }
}
