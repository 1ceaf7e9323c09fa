mod config;
mod graphql;
mod http;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use platform_obs::{ObsConfig, init_tracing};
use platform_store::seed;
use tracing::{debug, info};

use crate::{
    config::AppConfig,
    graphql::{GraphqlData, build_schema},
    http::{AppState, ServeConfig},
};

#[derive(Parser, Debug)]
#[command(name = "crm-server", version, about = "CRM pipeline server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Print the demo dataset as JSON.
    Seed,
    /// Print the GraphQL schema in SDL.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Write to a file instead of stdout")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

impl From<ServeCommand> for ServeConfig {
    fn from(value: ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv = dotenvy::dotenv();
    let _obs = init_tracing(ObsConfig::default())?;
    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded .env");
    }
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, AppConfig::load()?).await,
        Command::Seed => print_seed(),
        Command::SchemaPrint { output } => schema_print(output),
    }
}

fn print_seed() -> Result<()> {
    let dataset = seed::demo_dataset(chrono::Utc::now());
    println!("{}", serde_json::to_string_pretty(&dataset)?);
    Ok(())
}

fn schema_print(path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::from_lookup(|_| None)?;
    let schema = build_schema(GraphqlData {
        stores: config.store_set()?,
        write_timeout: config.store_timeout,
    });
    let sdl = schema.sdl();
    match path {
        Some(target) => {
            std::fs::write(&target, sdl)
                .with_context(|| format!("failed to write {}", target.display()))?;
            info!(path = %target.display(), "schema written");
        }
        None => println!("{sdl}"),
    }
    Ok(())
}

async fn run_server(cmd: ServeCommand, config: AppConfig) -> Result<()> {
    let stores = config.store_set()?;
    let schema = build_schema(GraphqlData {
        stores: stores.clone(),
        write_timeout: config.store_timeout,
    });
    let state = AppState {
        schema,
        stores,
        cors_allowed_origins: config.cors_allowed_origins,
    };
    http::serve(cmd.into(), state).await
}
