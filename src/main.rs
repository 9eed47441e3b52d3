//! study-pomodoro - focus timer for the study planner
//!
//! Runs work/break intervals in the terminal:
//! - 25 minutes of focused work, recorded on the planner backend
//! - 5 minutes of break
//! - an optional ambient sound looping while the timer runs

use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{CommandFactory, Parser};
use tracing::info;

use study_pomodoro::app::{AppOptions, PomodoroApp};
use study_pomodoro::backend::{IpcBackend, MemoryBackend, PomodoroBackend};
use study_pomodoro::cli::{Cli, Commands, Display, HistoryArgs, RunArgs, TerminalShell};
use study_pomodoro::config::{AppConfig, BackendConfig};
use study_pomodoro::sound::{HttpSoundFetcher, RodioOutput};
use study_pomodoro::types::{HistorySummary, SubjectId, TaskId};

/// Limit for downloading one ambient track.
const SOUND_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const LOG_DIR: &str = "study-pomodoro";
const LOG_FILE: &str = "study-pomodoro.log";

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(&cli);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// The interactive timer owns the terminal, so its logs go to a file
/// under the local data directory instead of stderr.
fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let interactive = matches!(cli.command, None | Some(Commands::Run(_)));
    if !interactive {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .init();
        return;
    }

    if let Some(file) = open_log_file() {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::data_local_dir()?.join(LOG_DIR);
    std::fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
        .ok()
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())
        .map_err(|e| anyhow!("{e}\nhint: {}", e.suggestion()))?;

    match cli.command {
        Some(Commands::Run(args)) => run(config, args).await,
        Some(Commands::History(args)) => history(config, args).await,
        Some(Commands::Sounds) => {
            let catalog = config.catalog()?;
            Display::show_sounds(&catalog, config.sound.default_sound);
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
            Ok(())
        }
        None => run(config, RunArgs::default()).await,
    }
}

/// Runs the interactive timer.
async fn run(mut config: AppConfig, args: RunArgs) -> Result<()> {
    apply_run_args(&mut config, &args);
    config.validate()?;

    let options = AppOptions {
        history_limit: config.backend.history_limit,
        catalog: config.catalog()?,
        volume: config.sound.volume,
        sound: config.sound.default_sound,
        subject_id: args.subject.map(SubjectId),
        task_id: args.task.map(TaskId),
    };
    let fetcher = Arc::new(HttpSoundFetcher::new(SOUND_FETCH_TIMEOUT)?);
    let output = RodioOutput::open_or_unavailable();

    if args.offline {
        info!("offline mode, sessions are kept in memory");
        run_shell(&config, Arc::new(MemoryBackend::new()), fetcher, output, options).await
    } else {
        let backend = connect_backend(&config.backend)?;
        info!(socket = %backend.socket_path().display(), "using planner backend");
        run_shell(&config, Arc::new(backend), fetcher, output, options).await
    }
}

async fn run_shell<B: PomodoroBackend>(
    config: &AppConfig,
    backend: Arc<B>,
    fetcher: Arc<HttpSoundFetcher>,
    output: RodioOutput,
    options: AppOptions,
) -> Result<()> {
    let app = PomodoroApp::new(config.timer, backend, fetcher, output, options);
    TerminalShell::new(app).run().await
}

/// Shows recent sessions from the backend.
async fn history(mut config: AppConfig, args: HistoryArgs) -> Result<()> {
    if args.socket.is_some() {
        config.backend.socket_path = args.socket;
    }
    let limit = args.limit.unwrap_or(config.backend.history_limit);

    let backend = connect_backend(&config.backend)?;
    let records = backend
        .get_pomodoro_history(limit)
        .await
        .context("failed to fetch session history")?;
    let summary = HistorySummary::from_records(&records, Utc::now().date_naive());

    Display::show_history(&records, &summary);
    Ok(())
}

/// Command-line values take precedence over the config file.
fn apply_run_args(config: &mut AppConfig, args: &RunArgs) {
    if let Some(work) = args.work {
        config.timer.work_minutes = work;
    }
    if let Some(break_minutes) = args.break_time {
        config.timer.break_minutes = break_minutes;
    }
    if let Some(sound) = args.sound {
        config.sound.default_sound = sound;
    }
    if let Some(volume) = args.volume {
        config.sound.volume = volume;
    }
    if let Some(socket) = &args.socket {
        config.backend.socket_path = Some(socket.clone());
    }
}

fn connect_backend(config: &BackendConfig) -> Result<IpcBackend> {
    let socket_path = match &config.socket_path {
        Some(path) => path.clone(),
        None => IpcBackend::default_socket_path()?,
    };
    Ok(IpcBackend::new(socket_path)
        .with_timeout(config.timeout())
        .with_session_token(config.session_token.clone()))
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
