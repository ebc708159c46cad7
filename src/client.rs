use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use reqwest::{
    Client, StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use url::Url;

use crate::auth::{self, AccessToken, Credentials, TokenStrategy};
use crate::error::ProbeError;
use crate::multipart::{self, MultipartBody};
use crate::rest_types::{CreateImportRequest, ImportResponse, MeResponse};
use crate::upload::{self, BATCH_BOUNDARY_PREFIX, FileUploadUnit, SINGLE_BOUNDARY_PREFIX};

pub const JSON_API: &str = "application/vnd.api+json";

const ME_ROUTE: &str = "api/v1/me";

fn imports_route(team_id: &str) -> String {
    format!("api/v1/teams/{team_id}/imports")
}

fn files_route(import_id: &str) -> String {
    format!("api/v1/imports/{import_id}/files")
}

fn process_route(import_id: &str) -> String {
    format!("api/v1/imports/{import_id}/process_files")
}

/// Status and body of the exploratory batch upload.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub status: StatusCode,
    pub body: String,
}

impl BatchOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self.status, StatusCode::OK | StatusCode::CREATED)
    }
}

/// Routes are joined relative to the base URL, so its path has to end in `/`
/// or `join` replaces the last segment.
pub fn api_root(mut base_url: Url) -> Url {
    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url
}

/// Builds the HTTP client shared by every request of a run.
pub fn http_client(insecure_tls: bool) -> Result<Client, ProbeError> {
    let mut builder = Client::builder();
    if insecure_tls {
        warn!("TLS certificate validation is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }
    Ok(builder.build()?)
}

/// Bearer-authenticated calls against the import API.
pub struct ImportClient {
    client: Client,
    base_url: Url,
    token: AccessToken,
}

impl ImportClient {
    pub fn new(client: Client, base_url: Url, token: AccessToken) -> Self {
        Self {
            client,
            base_url: api_root(base_url),
            token,
        }
    }

    /// Runs the scope fallback and returns a client holding the first token
    /// the server hands out.
    pub async fn authenticate(
        client: Client,
        base_url: Url,
        credentials: &Credentials,
        strategies: &[TokenStrategy],
    ) -> Result<Self, ProbeError> {
        let token = auth::acquire_token(&client, &base_url, credentials, strategies).await?;
        Ok(Self::new(client, base_url, token))
    }

    pub fn token(&self) -> &AccessToken {
        &self.token
    }

    pub async fn current_team_id(&self) -> Result<String, ProbeError> {
        let url = self.base_url.join(ME_ROUTE)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(self.token.secret())
            .header(ACCEPT, JSON_API)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!("Team lookup failed: {} - {}", status, body);
            return Err(ProbeError::Resolution { status, body });
        }

        let me: MeResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Unreadable team lookup response: {}", e);
            ProbeError::Resolution {
                status,
                body: body.clone(),
            }
        })?;

        me.data
            .current_team_id
            .ok_or(ProbeError::Resolution { status, body })
    }

    pub async fn create_import(&self, team_id: &str) -> Result<String, ProbeError> {
        let url = self.base_url.join(&imports_route(team_id))?;
        info!("Creating import for team {}", team_id);

        // Content type must be set before `.json()` to keep the JSON:API value.
        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.secret())
            .header(ACCEPT, JSON_API)
            .header(CONTENT_TYPE, JSON_API)
            .json(&CreateImportRequest::default())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if status != StatusCode::CREATED {
            warn!("Create import error: {} {}", status, body);
            return Err(ProbeError::SessionCreation { status, body });
        }

        let import: ImportResponse = serde_json::from_str(&body).map_err(|e| {
            warn!("Unreadable create import response: {}", e);
            ProbeError::SessionCreation {
                status,
                body: body.clone(),
            }
        })?;

        Ok(import.data.id)
    }

    /// Uploads one file with the `content_hash` field placed after the file
    /// part. Only `200` and `201` count as accepted.
    pub async fn upload_single_hash_last<P: AsRef<Path>>(
        &self,
        import_id: &str,
        file: P,
        remote_path: &str,
    ) -> Result<StatusCode, ProbeError> {
        let unit = FileUploadUnit::read(file, remote_path)?;
        info!(
            "Uploading {} ({} bytes) with hash last",
            unit.file_name,
            unit.bytes.len()
        );

        let form = upload::single_hash_last(multipart::boundary(SINGLE_BOUNDARY_PREFIX), &unit);
        let (status, body) = self.post_form(import_id, form).await?;

        match status {
            StatusCode::OK | StatusCode::CREATED => Ok(status),
            _ => {
                warn!("Upload of {} rejected: {} - {}", unit.file_name, status, body);
                Err(ProbeError::Upload { status, body })
            }
        }
    }

    /// Submits every file in one request using array-style field names. The
    /// server's answer is returned whatever it is.
    pub async fn upload_batch(
        &self,
        import_id: &str,
        files: &[PathBuf],
        remote_path: &str,
    ) -> Result<BatchOutcome, ProbeError> {
        let units = files
            .iter()
            .map(|path| FileUploadUnit::read(path, remote_path))
            .collect::<Result<Vec<_>, _>>()?;
        info!("Attempting batch upload of {} files", units.len());

        let form = upload::batch(
            multipart::boundary(BATCH_BOUNDARY_PREFIX),
            &units,
            remote_path,
        );
        let (status, body) = self.post_form(import_id, form).await?;

        info!("Batch status: {}", status);
        info!("Batch body: {}", body);

        Ok(BatchOutcome { status, body })
    }

    pub async fn process_import(&self, import_id: &str) -> Result<(), ProbeError> {
        let url = self.base_url.join(&process_route(import_id))?;
        info!("Requesting processing of import {}", import_id);

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.secret())
            .header(ACCEPT, JSON_API)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Process import error: {} {}", status, body);
            return Err(ProbeError::Processing { status, body });
        }

        Ok(())
    }

    async fn post_form(
        &self,
        import_id: &str,
        form: MultipartBody,
    ) -> Result<(StatusCode, String), ProbeError> {
        let url = self.base_url.join(&files_route(import_id))?;
        let content_type = form.content_type();
        let body = form.finish();
        debug!("POST {} ({} byte multipart body)", url, body.len());

        let response = self
            .client
            .post(url)
            .bearer_auth(self.token.secret())
            .header(ACCEPT, JSON_API)
            .header(CONTENT_TYPE, content_type)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Ok((status, body))
    }
}
