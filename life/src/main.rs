//! `life` command-line front end.
//!
//! Boards live in the configured store (`.life/data` by default), so a board
//! created by one invocation can be advanced and queried by later ones.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use life::core::grid::{ROW_DELIMITER, decode};
use life::core::patterns::{self, PATTERNS};
use life::core::types::BoardId;
use life::error::{NotFoundError, ValidationError};
use life::exit_codes;
use life::io::config::{DEFAULT_CONFIG_PATH, load_config};
use life::io::store::{Backend, Store, open_store};
use life::service::{BoardService, FinalState};

#[derive(Parser)]
#[command(
    name = "life",
    version,
    about = "Conway's Game of Life with a persisted generation log"
)]
struct Cli {
    /// Configuration file (missing file means defaults).
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Data directory; overrides the configured storage and selects the file backend.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a board and print its id.
    Create {
        /// Grid text; rows separated by newlines or '/'.
        #[arg(long)]
        state: Option<String>,
        /// Read grid text from a file.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Use a named pattern (see `life patterns`).
        #[arg(long)]
        pattern: Option<String>,
        /// Row count; defaults to the grid's.
        #[arg(long)]
        rows: Option<usize>,
        /// Column count; defaults to the grid's.
        #[arg(long)]
        cols: Option<usize>,
    },
    /// Print the initial state (generation 0).
    Show { id: BoardId },
    /// Advance one generation and print it.
    Next { id: BoardId },
    /// Print the generation at an already materialized step.
    At { id: BoardId, step: u64 },
    /// Advance until stable or out of budget; print the stable state.
    Final {
        id: BoardId,
        /// Step budget; defaults to `convergence.default_max_steps`.
        #[arg(long)]
        max_steps: Option<u64>,
        /// Print every generation appended on the way.
        #[arg(long)]
        trace: bool,
    },
    /// Print board dimensions and generation count as JSON.
    Info { id: BoardId },
    /// List board ids.
    List,
    /// Delete a board and all of its generations.
    Delete { id: BoardId },
    /// Re-check a board's generation log.
    Verify { id: BoardId },
    /// Validate a grid file without storing it.
    Check { file: PathBuf },
    /// List the named patterns accepted by `create --pattern`.
    Patterns,
}

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "warn";

fn main() {
    // Diagnostics go to stderr so they never mix with grid text on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_code_for(&err)
        }
    };
    std::process::exit(code);
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<NotFoundError>().is_some() {
        exit_codes::NOT_FOUND
    } else {
        exit_codes::INVALID
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match &cli.command {
        Command::Check { file } => return cmd_check(file),
        Command::Patterns => return cmd_patterns(),
        _ => {}
    }

    let service = open_service(&cli.config, cli.data_dir)?;
    match cli.command {
        Command::Create {
            state,
            file,
            pattern,
            rows,
            cols,
        } => cmd_create(&service, state, file, pattern, rows, cols),
        Command::Show { id } => print_state(service.initial_state(id)?),
        Command::Next { id } => print_state(service.advance_and_get(id)?),
        Command::At { id, step } => print_state(service.state_at_step(id, step)?),
        Command::Final {
            id,
            max_steps,
            trace,
        } => cmd_final(&service, id, max_steps, trace),
        Command::Info { id } => {
            let summary = service.summary(id)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(exit_codes::OK)
        }
        Command::List => {
            for id in service.board_ids()? {
                println!("{}", id);
            }
            Ok(exit_codes::OK)
        }
        Command::Delete { id } => {
            if !service.delete(id)? {
                return Err(NotFoundError::Board(id).into());
            }
            Ok(exit_codes::OK)
        }
        Command::Verify { id } => cmd_verify(&service, id),
        Command::Check { .. } | Command::Patterns => unreachable!("handled before opening store"),
    }
}

fn open_service(
    config_path: &Path,
    data_dir: Option<PathBuf>,
) -> Result<BoardService<Box<dyn Store>>> {
    let mut cfg = load_config(config_path)?;
    if let Some(dir) = data_dir {
        cfg.storage.backend = Backend::File;
        cfg.storage.dir = dir.display().to_string();
    }
    if cfg.storage.backend == Backend::Memory {
        warn!("memory backend selected; boards will not outlive this command");
    }
    let store = open_store(&cfg.storage).context("open store")?;
    Ok(BoardService::new(store, cfg.convergence))
}

fn cmd_create(
    service: &BoardService<Box<dyn Store>>,
    state: Option<String>,
    file: Option<PathBuf>,
    pattern: Option<String>,
    rows: Option<usize>,
    cols: Option<usize>,
) -> Result<i32> {
    let text = match (state, file, pattern) {
        (Some(state), None, None) => state.replace('/', &ROW_DELIMITER.to_string()),
        (None, Some(path), None) => {
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?
        }
        (None, None, Some(name)) => patterns::find(&name)
            .map(|pattern| pattern.to_grid().to_string())
            .ok_or_else(|| ValidationError::single(format!("unknown pattern '{}'", name)))?,
        _ => {
            return Err(ValidationError::single(
                "exactly one of --state, --file or --pattern is required",
            )
            .into());
        }
    };

    let (rows, cols) = match (rows, cols) {
        (Some(rows), Some(cols)) => (rows, cols),
        (rows, cols) => {
            let grid = decode(&text).context("decode initial state")?;
            (rows.unwrap_or(grid.rows()), cols.unwrap_or(grid.cols()))
        }
    };

    let id = service.create(&text, rows, cols)?;
    println!("{}", id);
    Ok(exit_codes::OK)
}

fn cmd_final(
    service: &BoardService<Box<dyn Store>>,
    id: BoardId,
    max_steps: Option<u64>,
    trace: bool,
) -> Result<i32> {
    let outcome = service.final_state_with(id, max_steps, |generation| {
        if trace {
            println!("step {}:\n{}\n", generation.step, generation.state);
        }
    })?;
    match outcome {
        FinalState::Stable { state, step } => {
            if trace {
                println!("stable at step {}:", step);
            }
            print_state(state)
        }
        FinalState::Unstable { max_steps, .. } => {
            eprintln!(
                "board {} did not reach a stable state within {} steps",
                id, max_steps
            );
            Ok(exit_codes::UNSTABLE)
        }
    }
}

fn cmd_verify(service: &BoardService<Box<dyn Store>>, id: BoardId) -> Result<i32> {
    let errors = service.verify(id)?;
    if errors.is_empty() {
        println!("ok");
        return Ok(exit_codes::OK);
    }
    for error in &errors {
        println!("- {}", error);
    }
    Ok(exit_codes::INVALID)
}

fn cmd_check(path: &Path) -> Result<i32> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let grid = decode(&text).with_context(|| format!("decode {}", path.display()))?;
    if grid.is_empty() {
        return Err(anyhow!("{} contains no cells", path.display()));
    }
    println!(
        "{}x{} grid, {} alive",
        grid.rows(),
        grid.cols(),
        grid.live_count()
    );
    Ok(exit_codes::OK)
}

fn cmd_patterns() -> Result<i32> {
    for pattern in PATTERNS {
        println!("{} ({}x{})", pattern.name, pattern.rows, pattern.cols);
    }
    Ok(exit_codes::OK)
}

fn print_state(state: String) -> Result<i32> {
    println!("{}", state);
    Ok(exit_codes::OK)
}
