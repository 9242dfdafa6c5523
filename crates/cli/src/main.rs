mod config;
mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use runtime::{
    ConversationLoop, LoopConfig, McpClient, McpIdentity, McpToolService, OpenAiBackend,
    SamplingConfig, Termination, Toolbox,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{API_KEY_ENV, Config, ToolTransport};
use error::{Error, Result};

const CONFIG_FILE: &str = "tooloop.toml";

#[derive(Parser)]
#[command(name = "tooloop")]
#[command(about = "Drive a tool-calling conversation against an MCP server", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ./tooloop.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one conversation until the model answers
    Run {
        /// The user message that starts the conversation
        prompt: String,
        /// Override the completion model
        #[arg(long)]
        model: Option<String>,
        /// Override the turn cap
        #[arg(long)]
        max_turns: Option<usize>,
    },
    /// List the tools the server offers
    Tools,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            prompt,
            model,
            max_turns,
        } => cmd_run(config, &prompt, model, max_turns).await,
        Commands::Tools => cmd_tools(config).await,
    }
}

async fn cmd_run(
    config: Config,
    prompt: &str,
    model: Option<String>,
    max_turns: Option<usize>,
) -> Result<()> {
    let config = config.with_overrides(model, max_turns)?;
    let mut backend = OpenAiBackend::builder(&config.completion.base_url, &config.completion.model)
        .timeout(config.completion_timeout());
    if let Some(key) = config.api_key(std::env::var(API_KEY_ENV).ok()) {
        backend = backend.api_key(key);
    }
    let backend = backend.build()?;
    info!(%backend, "completion backend ready");

    let toolbox = connect(&config).await?;

    let loop_config = LoopConfig {
        max_turns: config.run.max_turns,
        argument_policy: config.run.argument_policy,
        sampling: SamplingConfig::default(),
    };
    let agent = ConversationLoop::new(backend, toolbox).with_config(loop_config);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });

    let result = agent.run(prompt, &cancel).await;
    shutdown(agent.into_toolbox()).await;
    let outcome = result?;

    info!(
        turns = outcome.turns,
        tool_calls = outcome.tool_outputs.len(),
        messages = outcome.conversation.len(),
        "conversation finished"
    );

    match outcome.termination {
        Termination::Completed { content } => {
            println!("{}[Last Assistant Message]{}", "=".repeat(5), "=".repeat(51));
            println!("{content}");
            println!("{}", "=".repeat(80));
            Ok(())
        }
        Termination::Unresolved(anomaly) => Err(Error::Unresolved(anomaly)),
    }
}

async fn cmd_tools(config: Config) -> Result<()> {
    let toolbox = connect(&config).await?;

    if toolbox.descriptors().is_empty() {
        println!("No tools offered.");
    }
    for (descriptor, function) in toolbox.descriptors().iter().zip(toolbox.functions()) {
        println!(
            "Tool: {} - {} - {}",
            descriptor.name,
            descriptor.description.as_deref().unwrap_or(""),
            function.parameters
        );
    }

    shutdown(toolbox).await;
    Ok(())
}

async fn connect(config: &Config) -> Result<Toolbox<McpToolService>> {
    let identity = McpIdentity::new(&config.tools.client_name, &config.tools.client_version);

    let client = match config.transport()? {
        ToolTransport::Http { url } => {
            info!(%url, "connecting to tool server");
            McpClient::connect_http(&url, &identity).await
        }
        ToolTransport::Stdio { command, args } => {
            info!(%command, ?args, "spawning tool server");
            McpClient::spawn(&command, &args, &identity).await
        }
    }
    .map_err(|e| Error::Connection(e.to_string()))?;

    let toolbox = Toolbox::discover(McpToolService::new(client))
        .await?
        .with_call_timeout(config.call_timeout());
    Ok(toolbox)
}

async fn shutdown(toolbox: Toolbox<McpToolService>) {
    if let Err(e) = toolbox.into_service().shutdown().await {
        warn!(error = %e, "tool server did not shut down cleanly");
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None if Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}
