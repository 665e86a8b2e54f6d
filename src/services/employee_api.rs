//! Employee-record API: profile read/update, avatar upload, position list.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, multipart};
use serde::Deserialize;

use crate::form::model::{EmployeeRecord, EmployeeUpdatePayload, Position};
use crate::services::error::{self, ApiError, ApiResult};

/// The API wraps payloads as `{ "message": ..., "data": ... }`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    message: Option<String>,
    data: T,
}

#[derive(Debug, Deserialize)]
struct MessageOnly {
    #[serde(default)]
    message: Option<String>,
}

/// Server acknowledgement of a write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ack {
    pub message: Option<String>,
}

/// Writes may answer with an empty body (204 or a bare 200).
fn ack_from_body(body: &[u8]) -> ApiResult<Ack> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Ack::default());
    }
    let body: MessageOnly =
        serde_json::from_slice(body).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(Ack {
        message: body.message,
    })
}

/// Multipart avatar upload. `owner_id` is sent as `productId`, the field
/// name the image endpoint expects.
#[derive(Clone)]
pub struct ImageUpload {
    pub owner_id: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait EmployeeApi: Send + Sync {
    async fn get_employee_detail(&self, id: &str) -> ApiResult<EmployeeRecord>;

    async fn update_employee_detail(
        &self,
        payload: &EmployeeUpdatePayload,
        id: &str,
    ) -> ApiResult<Ack>;

    async fn post_employee_image(&self, upload: ImageUpload) -> ApiResult<Ack>;

    async fn get_all_positions(&self) -> ApiResult<Vec<Position>>;
}

#[derive(Debug, Clone)]
pub struct HttpEmployeeApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpEmployeeApi {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }
}

#[async_trait]
impl EmployeeApi for HttpEmployeeApi {
    async fn get_employee_detail(&self, id: &str) -> ApiResult<EmployeeRecord> {
        let req = self.authorized(self.client.get(self.url(&format!("employee/{id}"))));
        let res = error::check(req.send().await?).await?;
        let body: Envelope<EmployeeRecord> = error::json(res).await?;
        Ok(body.data)
    }

    async fn update_employee_detail(
        &self,
        payload: &EmployeeUpdatePayload,
        id: &str,
    ) -> ApiResult<Ack> {
        let req = self
            .authorized(self.client.put(self.url(&format!("employee/{id}"))))
            .json(payload);
        let res = error::check(req.send().await?).await?;
        ack_from_body(&res.bytes().await?)
    }

    async fn post_employee_image(&self, upload: ImageUpload) -> ApiResult<Ack> {
        let part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str(&upload.content_type)?;
        let form = multipart::Form::new()
            .part("images", part)
            .text("productId", upload.owner_id);

        let req = self
            .authorized(self.client.post(self.url("employee/upload-image")))
            .multipart(form);
        let res = error::check(req.send().await?).await?;
        ack_from_body(&res.bytes().await?)
    }

    async fn get_all_positions(&self) -> ApiResult<Vec<Position>> {
        let req = self.authorized(self.client.get(self.url("employee/positions")));
        let res = error::check(req.send().await?).await?;
        let body: Envelope<Vec<Position>> = error::json(res).await?;
        if let Some(msg) = body.message {
            tracing::debug!(%msg, "positions loaded");
        }
        Ok(body.data)
    }
}
