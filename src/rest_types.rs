use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::serde_utils;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub data: MeData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MeData {
    #[serde(default, deserialize_with = "serde_utils::deserialize_optional_id")]
    pub current_team_id: Option<String>,
}

/// JSON:API document for `POST /teams/{id}/imports`. The team is bound
/// through the URL, so `attributes` stays empty.
#[derive(Debug, Clone, Serialize)]
pub struct CreateImportRequest {
    pub data: CreateImportData,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateImportData {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub attributes: Map<String, Value>,
}

impl Default for CreateImportRequest {
    fn default() -> Self {
        Self {
            data: CreateImportData {
                type_: "imports",
                attributes: Map::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportResponse {
    pub data: ImportData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportData {
    #[serde(deserialize_with = "serde_utils::deserialize_id")]
    pub id: String,
}
