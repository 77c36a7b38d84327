//! Infrastructure layer: HTTP transport and configuration loading.

pub mod config;
pub mod http;

use std::sync::Arc;

use crate::domain::errors::{RecordError, RecordResult};
use crate::domain::models::RecorderConfig;
use crate::domain::ports::RecordClient;

/// Build the record client selected by configuration.
pub fn build_client(config: &RecorderConfig) -> RecordResult<Arc<dyn RecordClient>> {
    match config.client.as_str() {
        "http" => Ok(Arc::new(http::HttpRecordClient::new(&config.api)?)),
        other => Err(RecordError::Config(format!("unknown record client: {other}"))),
    }
}
