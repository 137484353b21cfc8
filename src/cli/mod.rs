//! Command-line interface parsing and process startup.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::gateway::Gateway;
use crate::server;

#[derive(Parser)]
#[command(name = "passerelle")]
#[command(about = "An HTTP gateway that normalizes chat requests across AI provider APIs")]
#[command(
    long_about = "Passerelle exposes a single POST /api/chat endpoint that accepts a \
provider-agnostic chat request and forwards it to Anthropic, OpenAI, Google, Groq, \
or a caller-supplied custom endpoint, returning a normalized response envelope.\n\n\
Credentials travel with each request body; the server stores none.\n\n\
Environment Variables:\n\
  RUST_LOG          Log filter, e.g. passerelle=debug (optional)\n\n\
Configuration:\n\
  A TOML config file is read from the platform config directory; use --config \
to point at another file. CLI flags override the config file."
)]
pub struct Args {
    /// Address to listen on, e.g. 127.0.0.1:8080 (overrides the config file)
    #[arg(short, long, value_name = "ADDR")]
    pub listen: Option<String>,

    /// Path to an alternate config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = match &args.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    let listen = args
        .listen
        .as_deref()
        .unwrap_or_else(|| config.listen_addr())
        .to_string();

    server::run(&listen, Gateway::new()).await
}
