/*
 * Responsibility
 * - request/response DTOs for /me
 * - shape checks (validate()) that do not need the form
 */
use serde::{Deserialize, Serialize};

use crate::form::SubmitOutcome;
use crate::form::cascade::RegionView;
use crate::form::model::{Field, RegionCode};
use crate::form::validation::ValidationState;

#[derive(Debug, Deserialize)]
pub struct FieldChangeRequest {
    pub field: Field,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct FieldChangeResponse {
    pub field: Field,
    pub error: Option<String>,
    pub errors: ValidationState,
}

#[derive(Debug, Deserialize)]
pub struct RegionCodeRequest {
    // None (or missing) clears the selection
    #[serde(default)]
    pub code: Option<RegionCode>,
}

#[derive(Debug, Deserialize)]
pub struct WardRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegionChangeResponse {
    /// false when a newer selection overtook this one
    pub applied: bool,
    pub regions: RegionView,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub file_name: Option<String>,
}

pub struct ImageUploadRequest<'a> {
    pub file_name: Option<&'a str>,
    pub content_type: &'a str,
    pub len: usize,
}

impl ImageUploadRequest<'_> {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.len == 0 {
            return Err("image body is empty");
        }
        if !self.content_type.starts_with("image/") {
            return Err("content-type must be an image type");
        }
        if let Some(name) = self.file_name
            && (name.trim().is_empty() || name.len() > 255)
        {
            return Err("file_name must be 1..=255 chars");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub outcome: SubmitOutcome,
}
