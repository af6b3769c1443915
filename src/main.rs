use anyhow::Result;
use clap::{Parser, Subcommand};
use lobster_room::config::{self, EnvCredentials};
use lobster_room::integrations::openclaw::client::HttpToolInvoker;
use lobster_room::server::{self, AppState};
use lobster_room::status::fleet::poll_fleet;
use lobster_room::status::PollContext;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "lobster-room")]
#[command(about = "Live activity status for a fleet of OpenClaw gateways")]
#[command(version)]
struct Args {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard and snapshot API (default)
    Serve {
        /// Address to bind (overrides DASHBOARD_BIND)
        #[arg(long, short)]
        bind: Option<String>,

        /// Port to listen on (overrides PORT / DASHBOARD_PORT)
        #[arg(long, short)]
        port: Option<u16>,

        /// Directory with static dashboard files
        #[arg(long)]
        web_root: Option<PathBuf>,
    },
    /// Poll every gateway once and print the snapshot as JSON
    Snapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lobster_room=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = config::load(args.config.as_deref())?;
    let invoker = HttpToolInvoker::new(config.polling.rpc_timeout_secs)?;

    match args.command.unwrap_or(Command::Serve {
        bind: None,
        port: None,
        web_root: None,
    }) {
        Command::Serve {
            bind,
            port,
            web_root,
        } => {
            if let Some(bind) = bind {
                config.server.host = bind;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(web_root) = web_root {
                config.server.web_root = web_root;
            }
            server::serve(AppState::new(config, invoker)).await
        }
        Command::Snapshot => {
            let ctx = PollContext::from_config(&config);
            let snapshot = poll_fleet(&ctx, &config.gateways(), &invoker, &EnvCredentials).await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
            if !snapshot.ok {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
