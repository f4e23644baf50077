// API client module: a small blocking HTTP client that submits one
// multipart form per CSV row to the upload endpoint. Calls are synchronous
// and each row is sent exactly once.

use crate::row::RowPayload;
use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Outcome of one row's upload, as written to the result file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UploadResult {
    pub status_code: u16,
    pub response_text: String,
}

impl UploadResult {
    /// Record for a row whose request never got a response.
    pub fn transport_failure(err: &anyhow::Error) -> Self {
        UploadResult { status_code: 0, response_text: format!("{:#}", err) }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Something that can send a validated payload. The batch runner only
/// depends on this, so tests can record payloads instead of sending them.
pub trait Dispatch {
    /// Consume the payload and send it. Attachments are closed when the
    /// payload is dropped, whatever the outcome.
    fn dispatch(&self, payload: RowPayload) -> Result<UploadResult>;
}

/// Blocking client for the fixed upload endpoint.
#[derive(Clone)]
pub struct UploadClient {
    client: Client,
    upload_url: String,
}

impl UploadClient {
    pub fn new(upload_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(UploadClient {
            client,
            upload_url: upload_url.into(),
        })
    }

    pub fn upload_url(&self) -> &str {
        &self.upload_url
    }

    /// Turn a payload into multipart form-data. Scalar fields become text
    /// parts and each attachment becomes a file part read from its handle.
    fn build_form(payload: RowPayload) -> multipart::Form {
        let RowPayload { fields, attachments } = payload;
        let mut form = multipart::Form::new();
        for (name, value) in fields {
            form = form.text(name, value.to_string());
        }
        for (name, att) in attachments {
            let part = multipart::Part::reader(att.file).file_name(att.file_name);
            form = form.part(name, part);
        }
        form
    }
}

impl Dispatch for UploadClient {
    fn dispatch(&self, payload: RowPayload) -> Result<UploadResult> {
        let form = Self::build_form(payload);
        let res = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .context("Failed to send upload request")?;

        let status = res.status();
        let txt = res.text().context("Failed to read upload response body")?;
        if status.is_success() {
            debug!(%status, "upload accepted");
        } else {
            warn!(%status, body = %txt, "upload rejected by server");
        }
        Ok(UploadResult {
            status_code: status.as_u16(),
            response_text: txt,
        })
    }
}
