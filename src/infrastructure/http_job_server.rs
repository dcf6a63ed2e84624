// HTTP job server - Control calls and event stream over reqwest
use crate::application::job_server::{EventStream, JobServer, JobServerError};
use crate::domain::bearing::BearingOption;
use crate::infrastructure::sse::SseDecoder;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response, header};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpJobServer {
    client: Client,
    base_url: String,
    control_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct Acknowledgement {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl HttpJobServer {
    pub fn new(base_url: &str, control_timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            control_timeout,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Turns a non-success response into `JobServerError::Api`, preferring
    /// the `error` field of a JSON body.
    async fn check(response: Response) -> Result<Response, JobServerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| format!("HTTP error {}", status.as_u16()));
        Err(JobServerError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn acknowledgement(response: Response) -> Result<String, JobServerError> {
        let body = Self::check(response).await?.bytes().await?;
        let ack: Acknowledgement = serde_json::from_slice(&body)?;
        Ok(ack.message)
    }
}

#[async_trait]
impl JobServer for HttpJobServer {
    async fn list_bearings(&self) -> Result<Vec<BearingOption>, JobServerError> {
        let response = self
            .client
            .get(self.url("bearings"))
            .timeout(self.control_timeout)
            .send()
            .await?;
        let body = Self::check(response).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn start_simulation(&self, bearing: &str) -> Result<String, JobServerError> {
        tracing::debug!(bearing, "requesting simulation start");
        let response = self
            .client
            .post(self.url("start-simulation"))
            .json(&json!({ "bearingName": bearing }))
            .timeout(self.control_timeout)
            .send()
            .await?;
        Self::acknowledgement(response).await
    }

    async fn stop_simulation(&self) -> Result<String, JobServerError> {
        tracing::debug!("requesting simulation stop");
        let response = self
            .client
            .get(self.url("stop-simulation"))
            .timeout(self.control_timeout)
            .send()
            .await?;
        Self::acknowledgement(response).await
    }

    async fn open_events(&self) -> Result<EventStream, JobServerError> {
        // No timeout here: the stream lives as long as the run.
        let response = self
            .client
            .get(self.url("events"))
            .header(header::ACCEPT, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;
        let response = Self::check(response).await?;
        tracing::debug!(url = %response.url(), "event stream open");

        let mut chunks = Box::pin(response.bytes_stream());
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = chunks.next().await {
                match chunk {
                    Ok(chunk) => {
                        for event in decoder.feed(&chunk) {
                            if event.is_message() {
                                yield Ok(event.data);
                            }
                        }
                    }
                    Err(err) => {
                        yield Err(JobServerError::Stream(err.to_string()));
                        break;
                    }
                }
            }
        };
        Ok(stream.boxed())
    }
}
