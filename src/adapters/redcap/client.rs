//! REDCap API client
//!
//! Talks to the REDCap API over HTTPS using form-encoded POST requests, the
//! only request shape the API understands.

use super::models::{ImportCountBody, MetadataField};
use super::traits::{ImportResponse, RecordSink};
use crate::config::RedcapConfig;
use crate::domain::{LoaderError, RedcapError, Result, UploadRecord};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;

/// REDCap API client for one project
///
/// # Example
///
/// ```no_run
/// use redcap_loader::adapters::redcap::RedcapClient;
/// use redcap_loader::config::load_config;
///
/// # async fn example() -> redcap_loader::domain::Result<()> {
/// let config = load_config("redcap-loader.toml")?;
/// let client = RedcapClient::connect(&config.redcap).await?;
/// println!("Record ID field: {}", client.def_field_name());
/// # Ok(())
/// # }
/// ```
pub struct RedcapClient {
    api_url: String,
    client: Client,
    config: RedcapConfig,
    def_field: String,
}

impl RedcapClient {
    /// Create a client and resolve the project's record ID field
    ///
    /// Uses `redcap.def_field` when configured, otherwise reads it from the
    /// project metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the metadata
    /// request fails.
    pub async fn connect(config: &RedcapConfig) -> Result<Self> {
        let http = build_http_client(config)?;

        let def_field = match &config.def_field {
            Some(field) => field.clone(),
            None => fetch_def_field(&http, config).await?,
        };

        tracing::info!(
            api_url = %config.api_url,
            def_field = %def_field,
            "Connected to REDCap project"
        );

        Ok(Self {
            api_url: config.api_url.clone(),
            client: http,
            config: config.clone(),
            def_field,
        })
    }

    /// Create a client with a known record ID field, without touching the network
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_def_field(config: &RedcapConfig, def_field: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api_url: config.api_url.clone(),
            client: build_http_client(config)?,
            config: config.clone(),
            def_field: def_field.into(),
        })
    }

    /// Record ID field of the project
    pub fn def_field_name(&self) -> &str {
        &self.def_field
    }

    /// API endpoint this client posts to
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

fn build_http_client(config: &RedcapConfig) -> Result<Client> {
    let mut builder = ClientBuilder::new()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)));

    if !config.tls_verify {
        tracing::warn!("TLS certificate verification is disabled for the REDCap API");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder
        .build()
        .map_err(|e| LoaderError::Configuration(format!("Failed to build HTTP client: {e}")))
}

/// Read the first field of the project data dictionary
///
/// # Errors
///
/// Returns an error if the request fails or the project has no fields.
pub async fn fetch_def_field(client: &Client, config: &RedcapConfig) -> Result<String> {
    let token = config.token.expose_secret();
    let params = [
        ("token", token.as_ref()),
        ("content", "metadata"),
        ("format", "json"),
        ("returnFormat", "json"),
    ];

    tracing::debug!(api_url = %config.api_url, "Fetching project metadata");

    let body = post_form(client, &config.api_url, &params).await?;
    let fields: Vec<MetadataField> = serde_json::from_str(&body).map_err(|e| {
        RedcapError::InvalidResponse(format!("Failed to parse project metadata: {e}"))
    })?;

    let first = fields.into_iter().next().ok_or_else(|| {
        RedcapError::InvalidResponse("Project metadata contains no fields".to_string())
    })?;

    tracing::debug!(
        def_field = %first.field_name,
        form = %first.form_name,
        "Resolved record ID field from project metadata"
    );

    Ok(first.field_name)
}

async fn post_form(
    client: &Client,
    url: &str,
    params: &[(&str, &str)],
) -> std::result::Result<String, RedcapError> {
    let response = client
        .post(url)
        .form(params)
        .send()
        .await
        .map_err(map_transport_error)?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RedcapError::InvalidResponse(format!("Failed to read response body: {e}")))?;

    match status {
        s if s.is_success() => Ok(body),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(RedcapError::AuthenticationFailed(format!("status {status}: {body}")))
        }
        _ => Err(RedcapError::Rejected {
            status: status.as_u16(),
            body,
        }),
    }
}

fn map_transport_error(e: reqwest::Error) -> RedcapError {
    if e.is_timeout() {
        RedcapError::Timeout(e.to_string())
    } else {
        RedcapError::ConnectionFailed(e.to_string())
    }
}

#[async_trait]
impl RecordSink for RedcapClient {
    async fn send_records(
        &self,
        records: &[UploadRecord],
        overwrite: bool,
    ) -> std::result::Result<ImportResponse, RedcapError> {
        let fields: Vec<_> = records.iter().map(|r| &r.fields).collect();
        let data = serde_json::to_string(&fields).map_err(|e| {
            RedcapError::InvalidResponse(format!("Failed to serialize records: {e}"))
        })?;

        let token = self.config.token.expose_secret();
        let params = [
            ("token", token.as_ref()),
            ("content", "record"),
            ("format", "json"),
            ("type", "flat"),
            (
                "overwriteBehavior",
                if overwrite { "overwrite" } else { "normal" },
            ),
            ("data", data.as_str()),
            ("returnContent", "count"),
            ("returnFormat", "json"),
        ];

        tracing::debug!(records = records.len(), overwrite, "Importing records");

        let body = post_form(&self.client, &self.api_url, &params).await?;
        let parsed: ImportCountBody = serde_json::from_str(&body).map_err(|e| {
            RedcapError::InvalidResponse(format!("Unexpected import response '{body}': {e}"))
        })?;
        let count = parsed.count.value().ok_or_else(|| {
            RedcapError::InvalidResponse(format!("Import count is not a number: {body}"))
        })?;

        Ok(ImportResponse::new(count))
    }

    fn def_field(&self) -> &str {
        &self.def_field
    }
}
