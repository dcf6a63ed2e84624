// Job server trait for the remote simulation endpoints
use crate::domain::bearing::BearingOption;
use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// Data payloads of the event stream, one item per message frame.
pub type EventStream = BoxStream<'static, Result<String, JobServerError>>;

#[derive(Debug, Error)]
pub enum JobServerError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Non-success response; carries the server's `error` text when present
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("event stream error: {0}")]
    Stream(String),

    #[error("event stream closed by server")]
    StreamClosed,
}

#[async_trait]
pub trait JobServer: Send + Sync {
    /// List the bearings a simulation can be started for
    async fn list_bearings(&self) -> Result<Vec<BearingOption>, JobServerError>;

    /// Ask the job server to start processing `bearing`; returns its acknowledgement
    async fn start_simulation(&self, bearing: &str) -> Result<String, JobServerError>;

    /// Ask the job server to halt the current job; returns its acknowledgement
    async fn stop_simulation(&self) -> Result<String, JobServerError>;

    /// Open the event stream. Resolves once the connection is established.
    async fn open_events(&self) -> Result<EventStream, JobServerError>;
}
