use std::sync::Arc;

use clap::{Parser, Subcommand};
use qbridge_agent::tools::q_developer::QDeveloperRequest;
use qbridge_agent::tools::{Tool, ToolContext};
use qbridge_core::config::{QbridgeConfig, CONFIG_PATH_ENV};
use qbridge_core::ProcessEnv;
use qbridge_protocol::mcp::ListToolsResult;
use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod mcp_bridge;
mod tools;

/// MCP server exposing the AWS Q Developer CLI as a tool.
#[derive(Parser, Debug)]
#[command(name = "qbridge", version, about, long_about = None)]
struct Cli {
    /// Path to qbridge.toml (falls back to QBRIDGE_CONFIG, then ~/.qbridge/qbridge.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve MCP over stdin/stdout (default)
    Serve,

    /// Print the tool descriptors as JSON
    Tools,

    /// Run one prompt through the Q Developer tool and print the answer
    Ask {
        prompt: String,

        /// Resume the previous conversation
        #[arg(long)]
        resume: bool,

        /// Context profile to use
        #[arg(long)]
        agent: Option<String>,

        /// Model override, e.g. claude-sonnet-4
        #[arg(long)]
        model: Option<String>,

        /// Trust every tool without confirmation
        #[arg(long)]
        yolo: bool,

        /// Comma-separated tools to trust
        #[arg(long, value_name = "TOOLS")]
        trust_tools: Option<String>,

        /// Verbose CLI output
        #[arg(long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "qbridge_gateway=info,qbridge_agent=info,qbridge_terminal=info".into()
            }),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > QBRIDGE_CONFIG env > ~/.qbridge/qbridge.toml
    let config_path = cli.config.or_else(|| std::env::var(CONFIG_PATH_ENV).ok());
    let config = QbridgeConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        QbridgeConfig::default()
    });

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Tools => {
            let registry = tools::build_registry(&config.q_cli.command);
            let list = ListToolsResult {
                tools: registry.descriptors(),
            };
            println!("{}", serde_json::to_string_pretty(&list)?);
            Ok(())
        }
        Command::Ask {
            prompt,
            resume,
            agent,
            model,
            yolo,
            trust_tools,
            verbose,
        } => {
            let request = QDeveloperRequest {
                prompt,
                resume,
                agent,
                override_model: model,
                yolo_mode: yolo,
                trust_tools,
                verbose,
            };
            ask(&config, request).await
        }
    }
}

async fn serve(config: QbridgeConfig) -> anyhow::Result<()> {
    let command = config.q_cli.command.clone();
    if tools::is_command_available(&command) {
        info!(%command, "Q Developer CLI found");
    } else {
        warn!(
            %command,
            "Q Developer CLI not found on PATH; tool calls will fail until it is installed"
        );
    }

    let registry = tools::build_registry(&command);
    info!(
        name = %config.server.name,
        tools = ?registry.names(),
        "MCP server listening on stdio"
    );

    let server = Arc::new(mcp_bridge::McpServer::new(
        config,
        registry,
        Arc::new(ProcessEnv),
    ));
    server
        .serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
        .await?;

    info!("stdin closed, shutting down");
    Ok(())
}

async fn ask(config: &QbridgeConfig, request: QDeveloperRequest) -> anyhow::Result<()> {
    let tool = qbridge_agent::tools::q_developer::QDeveloperTool::new(&config.q_cli.command);

    // Ctrl-C kills the child instead of orphaning it.
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let ctx = ToolContext::default().with_cancel(cancel);
    let output = tool.execute(&ctx, serde_json::to_value(&request)?).await?;
    print!("{}", output.content);
    if !output.content.ends_with('\n') {
        println!();
    }
    Ok(())
}
