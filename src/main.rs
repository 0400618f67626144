//! TLA+ Runner - run the TLA+ tools from a terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tlaplus_runner::check::{
    CheckError, CheckRun, DebugFrontend, EchoFactory, Workflow, DEFAULT_ATTACH_DELAY,
};
use tlaplus_runner::config::{ConfigError, ConfigLoader, ToolsConfig};
use tlaplus_runner::diagnostic::Severity;
use tlaplus_runner::display::{self, ConsoleDiagnostics, ConsoleEcho};
use tlaplus_runner::output::LineSink;
use tlaplus_runner::process::{ExitClass, ToolError, ToolRunner};
use tlaplus_runner::tools::{SpecError, SpecFiles, ToolKind};

/// Process exit code when the tools found problems in the spec.
const EXIT_ISSUES: i32 = 1;
/// Process exit code when the tools could not be run.
const EXIT_FAILURE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "tlaplus-runner",
    about = "Run the TLA+ tools and report their results",
    version
)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the default search paths.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to tla2tools.jar.
    #[arg(long, global = true)]
    tools_jar: Option<PathBuf>,

    /// Java installation to use instead of `java` on PATH.
    #[arg(long, global = true)]
    java_home: Option<PathBuf>,

    /// Echo the tools' plain output to stderr.
    #[arg(long, global = true)]
    echo: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate PlusCal and parse a module.
    Parse {
        /// The .tla module.
        file: PathBuf,
    },
    /// Check a model with TLC.
    Check {
        /// The .tla module or its .cfg model.
        file: PathBuf,
        /// Model file to use instead of the sibling .cfg.
        #[arg(long)]
        model: Option<PathBuf>,
        /// Print events as JSON lines.
        #[arg(long)]
        json: bool,
        /// Do not write the raw output to <spec>.out.
        #[arg(long)]
        no_out_file: bool,
        /// Extra TLC arguments.
        #[arg(last = true)]
        tlc_args: Vec<String>,
    },
    /// Check a model with the TLC debugger enabled.
    Debug {
        /// The .tla module or its .cfg model.
        file: PathBuf,
        /// Model file to use instead of the sibling .cfg.
        #[arg(long)]
        model: Option<PathBuf>,
        /// Milliseconds to wait before announcing the debugger port.
        #[arg(long)]
        attach_delay_ms: Option<u64>,
        /// Extra TLC arguments.
        #[arg(last = true)]
        tlc_args: Vec<String>,
    },
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(cli: &Cli) -> Result<ToolsConfig, ConfigError> {
    let loader = match &cli.config {
        Some(path) => ConfigLoader::with_path(path.clone()),
        None => ConfigLoader::new(),
    };
    let mut config = loader.load()?;
    if let Some(jar) = &cli.tools_jar {
        config.tools_jar = Some(jar.clone());
    }
    if let Some(home) = &cli.java_home {
        config.java_home = Some(home.clone());
    }
    Ok(config)
}

fn spec_files(file: &Path, model: Option<&Path>) -> Result<SpecFiles, SpecError> {
    match model {
        Some(cfg) => SpecFiles::new(file, cfg),
        None => SpecFiles::discover(file),
    }
}

/// Tells the user where to attach; the terminal has no adapter of its own.
struct AnnouncePort;

#[async_trait]
impl DebugFrontend for AnnouncePort {
    async fn attach(&self, port: u16) -> std::io::Result<()> {
        display::print_info(&format!(
            "TLC debugger listening on 127.0.0.1:{port}, attach a debug adapter client"
        ));
        Ok(())
    }
}

async fn run_parse(workflow: &Workflow, file: PathBuf) -> Result<i32, CheckError> {
    let outcome = workflow
        .parse_module(&file, &mut ConsoleDiagnostics)
        .await?;
    if outcome.translated {
        display::print_info("PlusCal translation completed");
    }
    for stderr in &outcome.stderr {
        display::print_tool_stderr(stderr);
    }
    if outcome.diagnostics.count(Severity::Error) > 0 {
        Ok(EXIT_ISSUES)
    } else {
        display::print_info(&format!("{} parsed without errors", file.display()));
        Ok(0)
    }
}

async fn follow(mut run: CheckRun, json: bool) -> Result<i32, CheckError> {
    loop {
        tokio::select! {
            event = run.next_event() => match event {
                Some(event) if json => display::print_event_json(&event),
                Some(event) => display::print_event(&event),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupt received, stopping model check");
                run.cancel();
            }
        }
    }

    let outcome = run.wait().await?;
    if !json {
        display::print_stream_warnings(&outcome.summary);
    }
    if let Some(stderr) = &outcome.stderr {
        display::print_tool_stderr(stderr);
    }
    let success = outcome
        .summary
        .model_check
        .as_ref()
        .is_some_and(|r| r.success);
    Ok(match outcome.exit {
        _ if outcome.cancelled || outcome.summary.is_truncated() => EXIT_FAILURE,
        ExitClass::Success if success => 0,
        _ => EXIT_ISSUES,
    })
}

fn console_echo() -> EchoFactory {
    Arc::new(|kind: ToolKind| -> Box<dyn LineSink> { Box::new(ConsoleEcho::new(kind)) })
}

async fn run(cli: Cli) -> Result<i32, Box<dyn std::error::Error>> {
    let mut config = load_config(&cli)?;
    if let Commands::Check {
        no_out_file: true, ..
    } = cli.command
    {
        config.create_out_files = false;
    }
    let mut workflow = Workflow::new(ToolRunner::new(config));
    if cli.echo {
        workflow = workflow.with_echo(console_echo());
    }

    let code = match cli.command {
        Commands::Parse { file } => run_parse(&workflow, file).await?,
        Commands::Check {
            file,
            model,
            json,
            tlc_args,
            ..
        } => {
            let spec = spec_files(&file, model.as_deref()).map_err(ToolError::from)?;
            let run = workflow.check_model(spec, &tlc_args).await?;
            follow(run, json).await?
        }
        Commands::Debug {
            file,
            model,
            attach_delay_ms,
            tlc_args,
        } => {
            let spec = spec_files(&file, model.as_deref()).map_err(ToolError::from)?;
            let delay = attach_delay_ms.map_or(DEFAULT_ATTACH_DELAY, Duration::from_millis);
            let run = workflow
                .check_and_debug(spec, &tlc_args, &AnnouncePort, delay)
                .await?;
            follow(run, false).await?
        }
    };
    Ok(code)
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            display::print_error(&e.to_string());
            std::process::exit(EXIT_FAILURE);
        }
    }
}
