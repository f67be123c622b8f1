pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod format;
pub mod models;
pub mod upload;

use std::sync::Arc;

use anyhow::Result;

pub use api::{Gateway, GatewayClient};
pub use app::{Intent, MemeBoard, Notice};
pub use config::BoardConfig;
pub use error::{BoardError, GatewayError, ValidationError};

/// Builds a board talking to the configured gateway.
pub fn connect(config: &BoardConfig) -> Result<MemeBoard> {
    let client = GatewayClient::with_timeout(config.gateway_url.clone(), config.request_timeout)?;
    log::info!("using gateway at {}", client.base_url());
    Ok(MemeBoard::new(Arc::new(client)))
}
