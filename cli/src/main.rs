use clap::Parser;
mod app;
mod commands;
mod ui;
use commands::cli;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use wavecrew_core::config::AppConfig;
use wavecrew_core::error;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, error::CliError> {
    let args = cli::Args::parse();
    let mut cfg = match &args.config {
        Some(path) => wavecrew_core::config::load_from_path(path),
        None => wavecrew_core::config::load_default(),
    }
    .map_err(|e| error::CliError::Config(e.to_string()))?;
    if let Some(bin) = args.agent_bin.as_deref().filter(|b| !b.trim().is_empty()) {
        cfg.runner.binary = bin.to_string();
    }
    init_tracing(&cfg.logging).map_err(error::CliError::Command)?;

    let root = project_root(args.root.as_deref())?;
    dispatch(args.command, cfg, root).await
}

async fn dispatch(
    cmd: cli::Commands,
    cfg: AppConfig,
    root: PathBuf,
) -> Result<i32, error::CliError> {
    match cmd {
        cli::Commands::Run(run_args) => app::run_plan_file(&cfg, root, run_args).await,
        cli::Commands::Plan(plan_args) => app::run_planner(&cfg, root, plan_args).await,
        cli::Commands::Agents(agents_args) => app::list_agents(&cfg, &root, agents_args),
    }
}

fn project_root(requested: Option<&std::path::Path>) -> Result<PathBuf, error::CliError> {
    let cwd = std::env::current_dir()?;
    Ok(match requested {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd,
    })
}

fn exit_code_for_error(e: &error::CliError) -> i32 {
    // 0: success
    // 1: workflow finished with failed or blocked tasks (not an error value)
    // 2: cancelled (not an error value)
    // 11: config error
    // 20: runner start / IO error
    // 30: invalid plan or agent selection
    // 50: internal/uncategorized
    match e {
        error::CliError::Config(_) => 11,
        error::CliError::Workflow(we) => match we {
            error::WorkflowError::Plan(_) => 30,
            error::WorkflowError::MissingAgents { .. } => 30,
            error::WorkflowError::Runner(re) => match re {
                error::RunnerError::Config(_) => 11,
                error::RunnerError::Spawn(_) => 20,
                error::RunnerError::StreamIo { .. } => 20,
                error::RunnerError::Plugin(_) => 50,
            },
        },
        error::CliError::Io(_) => 20,
        error::CliError::Command(_) => 20,
        error::CliError::Anyhow(_) => 50,
    }
}

fn init_tracing(logging: &wavecrew_core::config::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("wavecrew"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("wavecrew.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
