use std::env;

use anyhow::Result;
use clap::Parser;
use memeboard_frontend::config::{BoardConfig, GATEWAY_URL_VAR, USER_NAME_VAR};

mod shell;

#[derive(Debug, Parser)]
#[command(name = "memeboard", about = "Terminal client for the ephemeral meme board")]
struct Args {
    /// Gateway base URL, overrides MEMEBOARD_GATEWAY_URL.
    #[arg(long)]
    gateway_url: Option<String>,

    /// Identify as this user on startup.
    #[arg(long)]
    user: Option<String>,
}

fn main() -> Result<()> {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("memeboard_frontend=info,memeboard_shell=info"),
    )
    .try_init();

    let args = Args::parse();
    let config = BoardConfig::from_lookup(|key| match key {
        GATEWAY_URL_VAR if args.gateway_url.is_some() => args.gateway_url.clone(),
        USER_NAME_VAR if args.user.is_some() => args.user.clone(),
        other => env::var(other).ok(),
    })?;

    let board = memeboard_frontend::connect(&config)?;
    shell::run(board, config.user_name.as_deref())
}
