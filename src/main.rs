use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use weft_core::config::AppConfig;
use weft_engine::{Graph, GraphExecutor};
use weft_llm::ProviderFactory;
use weft_tools::StaticCatalog;

#[derive(Parser)]
#[command(name = "weft", version, about = "Workflow graph execution engine")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "weft.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a workflow graph from a JSON file and print the result
    Run {
        /// Path to the graph JSON file
        #[arg(short, long)]
        graph: PathBuf,
        /// Suppress the step trace, print only the final response
        #[arg(short, long)]
        quiet: bool,
    },
    /// Start the HTTP gateway server
    Serve,
    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("weft=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        AppConfig::load(&cli.config)?
    } else {
        AppConfig::default()
    };

    match cli.command {
        Commands::Run { graph, quiet } => {
            let content = std::fs::read_to_string(&graph)?;
            let graph: Graph = serde_json::from_str(&content)?;

            let executor = build_executor(&config);
            let outcome = executor.execute(&graph).await?;

            if !quiet {
                for step in &outcome.steps {
                    eprintln!("{}", step);
                }
                eprintln!();
            }
            println!("{}", outcome.response);
        }
        Commands::Serve => {
            let executor = Arc::new(build_executor(&config));
            let server = weft_gateway::GatewayServer::new(config.gateway.clone(), executor);

            let cancel = tokio_util::sync::CancellationToken::new();
            let cancel_clone = cancel.clone();

            // Graceful shutdown on Ctrl-C
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutting down gateway...");
                cancel_clone.cancel();
            });

            server.run(cancel).await?;
        }
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn build_executor(config: &AppConfig) -> GraphExecutor {
    GraphExecutor::new(
        Arc::new(ProviderFactory),
        Arc::new(StaticCatalog::with_builtins()),
        config.engine.clone(),
    )
}
