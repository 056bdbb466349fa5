//! HTTP client over the automation backend

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as Base64;
use base64::Engine as _;
use flow_exec::{ActionBackend, ActionOutcome, BackendError, RunContext, ScreenshotPayload};
use flow_graph::{ActionKind, FlowGraph};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shot_store::ShotFormat;
use tracing::debug;
use url::Url;

use crate::config::BackendConfig;
use crate::errors::ClientError;
use crate::types::{
    ActionRequest, ActionResponse, ExportCodeRequest, ExportCodeResponse, ExportJsonRequest,
    ImportAnalysis, ImportAnalyzeRequest,
};

/// Client for the remote automation backend.
pub struct BackendClient {
    http: reqwest::Client,
    base: Url,
    api_key: Option<String>,
}

impl BackendClient {
    pub fn new(cfg: &BackendConfig) -> Result<Self, ClientError> {
        // A trailing slash keeps Url::join from eating the last path segment.
        let mut base_url = cfg.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base =
            Url::parse(&base_url).map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base,
            api_key: cfg.api_key.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path)
            .map_err(|e| ClientError::InvalidBaseUrl(e.to_string()))
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        debug!(url = %url, "backend request");

        let mut request = self.http.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(ClientError::from_reqwest)?;
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .ok()
                .map(|body| extract_error_message(&body))
                .unwrap_or_default();
            return Err(ClientError::Status {
                code: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Execute one action: `POST /api/actions/{type}`.
    pub async fn execute_action(
        &self,
        action: &ActionKind,
        ctx: &RunContext,
    ) -> Result<ActionOutcome, BackendError> {
        let path = format!("api/actions/{}", action.type_name());
        let body = ActionRequest {
            params: action,
            variables: &ctx.variables,
        };

        let response: ActionResponse = self
            .post_json(&path, &body)
            .await
            .map_err(ClientError::into_backend_error)?;

        if !response.success {
            // The backend executed the request and reports the action itself
            // as wrong (bad selector, unreachable element); not retryable.
            return Err(BackendError::Validation(
                response.error.unwrap_or_else(|| "action failed".into()),
            ));
        }

        let screenshot = match response.screenshot {
            Some(encoded) => {
                let bytes = Base64
                    .decode(encoded.as_bytes())
                    .map_err(|e| BackendError::Fatal(format!("screenshot decode failed: {e}")))?;
                Some(ScreenshotPayload {
                    format: parse_shot_format(response.screenshot_format.as_deref()),
                    bytes,
                })
            }
            None => None,
        };

        Ok(ActionOutcome {
            data: response.data,
            screenshot,
        })
    }

    /// Canonical JSON export rendered by the backend.
    pub async fn export_json(&self, graph: &FlowGraph) -> Result<serde_json::Value, ClientError> {
        self.post_json("api/export/json", &ExportJsonRequest { flow: graph })
            .await
    }

    /// Generated automation script for a flow.
    pub async fn export_code(
        &self,
        graph: &FlowGraph,
        language: &str,
    ) -> Result<ExportCodeResponse, ClientError> {
        self.post_json(
            "api/export/code",
            &ExportCodeRequest {
                flow: graph,
                language,
            },
        )
        .await
    }

    /// Submit pasted script/JSON for analysis into a proposed flow.
    pub async fn import_analyze(&self, source: &str) -> Result<ImportAnalysis, ClientError> {
        self.post_json("api/import/analyze", &ImportAnalyzeRequest { source })
            .await
    }
}

#[async_trait]
impl ActionBackend for BackendClient {
    async fn execute(
        &self,
        action: &ActionKind,
        ctx: &RunContext,
    ) -> Result<ActionOutcome, BackendError> {
        self.execute_action(action, ctx).await
    }
}

fn parse_shot_format(raw: Option<&str>) -> ShotFormat {
    match raw {
        Some("jpeg") | Some("jpg") => ShotFormat::Jpeg,
        _ => ShotFormat::Png,
    }
}

/// Pull a human-readable message out of an error body, which is usually
/// `{"error": "..."}` but occasionally plain text.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("error").and_then(|e| e.as_str()) {
            return message.to_string();
        }
    }
    let trimmed = body.trim();
    let mut message: String = trimmed.chars().take(200).collect();
    if message.len() < trimmed.len() {
        message.push('…');
    }
    message
}
