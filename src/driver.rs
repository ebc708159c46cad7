//! Sequences authentication, team lookup, import creation and the upload
//! probes, turning every outcome into a [`StageReport`].
//!
//! A run never fails as a whole. Stages that cannot run because an earlier
//! one failed are reported as skipped, and nothing after a failed
//! authentication touches the network.

use std::fmt;
use std::path::PathBuf;

use log::info;
use url::Url;

use crate::auth::SCOPE_FALLBACK;
use crate::client::{self, ImportClient};
use crate::config::Config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Authenticate,
    ResolveTeam,
    CreateImport,
    UploadSingle,
    UploadBatch,
    ProcessImport,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Authenticate,
        Stage::ResolveTeam,
        Stage::CreateImport,
        Stage::UploadSingle,
        Stage::UploadBatch,
        Stage::ProcessImport,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Authenticate => write!(f, "Authenticate"),
            Stage::ResolveTeam => write!(f, "Resolve team"),
            Stage::CreateImport => write!(f, "Create import"),
            Stage::UploadSingle => write!(f, "Upload (hash last)"),
            Stage::UploadBatch => write!(f, "Upload (batch)"),
            Stage::ProcessImport => write!(f, "Process import"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Succeeded(String),
    Failed(String),
    Skipped(String),
}

#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage: Stage,
    pub outcome: StageOutcome,
    /// Raw server answer, kept for the exploratory batch upload.
    pub response_body: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProbeReport {
    pub base_url: Url,
    pub stages: Vec<StageReport>,
}

impl ProbeReport {
    fn new(base_url: Url) -> Self {
        Self {
            base_url,
            stages: Vec::new(),
        }
    }

    fn push(&mut self, stage: Stage, outcome: StageOutcome) {
        self.stages.push(StageReport {
            stage,
            outcome,
            response_body: None,
        });
    }

    fn skip_after(&mut self, stage: Stage, reason: &str) {
        for later in Stage::ALL.iter().skip_while(|s| **s != stage).skip(1) {
            self.push(*later, StageOutcome::Skipped(reason.to_string()));
        }
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| &r.outcome)
    }

    pub fn succeeded(&self, stage: Stage) -> bool {
        matches!(self.outcome(stage), Some(StageOutcome::Succeeded(_)))
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub batch: bool,
    pub process_import: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            batch: true,
            process_import: false,
        }
    }
}

pub struct Driver {
    config: Config,
}

impl Driver {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(&self, options: &RunOptions) -> ProbeReport {
        let mut report = ProbeReport::new(self.config.base_url.clone());

        let http = match client::http_client(self.config.insecure_tls) {
            Ok(http) => http,
            Err(e) => {
                report.push(Stage::Authenticate, StageOutcome::Failed(e.to_string()));
                report.skip_after(Stage::Authenticate, "no HTTP client");
                return report;
            }
        };

        let client = match ImportClient::authenticate(
            http,
            self.config.base_url.clone(),
            &self.config.credentials,
            &SCOPE_FALLBACK,
        )
        .await
        {
            Ok(client) => {
                let token = client.token();
                let mut detail = format!("token issued for {}", token.strategy);
                if let Some(expires_in) = token.expires_in {
                    detail.push_str(&format!(
                        ", valid for {}",
                        humantime::format_duration(expires_in)
                    ));
                }
                report.push(Stage::Authenticate, StageOutcome::Succeeded(detail));
                client
            }
            Err(e) => {
                report.push(Stage::Authenticate, StageOutcome::Failed(e.to_string()));
                report.skip_after(Stage::Authenticate, "no access token");
                return report;
            }
        };

        let team_id = match &self.config.team_id {
            Some(team_id) => {
                report.push(
                    Stage::ResolveTeam,
                    StageOutcome::Succeeded(format!("team {team_id} (configured)")),
                );
                team_id.clone()
            }
            None => match client.current_team_id().await {
                Ok(team_id) => {
                    info!("Team ID: {}", team_id);
                    report.push(
                        Stage::ResolveTeam,
                        StageOutcome::Succeeded(format!("team {team_id}")),
                    );
                    team_id
                }
                Err(e) => {
                    report.push(Stage::ResolveTeam, StageOutcome::Failed(e.to_string()));
                    report.skip_after(Stage::ResolveTeam, "no team id");
                    return report;
                }
            },
        };

        let import_id = match client.create_import(&team_id).await {
            Ok(import_id) => {
                info!("Import ID: {}", import_id);
                report.push(
                    Stage::CreateImport,
                    StageOutcome::Succeeded(format!("import {import_id}")),
                );
                import_id
            }
            Err(e) => {
                report.push(Stage::CreateImport, StageOutcome::Failed(e.to_string()));
                report.skip_after(Stage::CreateImport, "no import session");
                return report;
            }
        };

        self.upload_single(&client, &import_id, &mut report).await;
        self.upload_batch(&client, &import_id, options, &mut report)
            .await;

        let outcome = if !options.process_import {
            StageOutcome::Skipped("not requested".to_string())
        } else {
            match client.process_import(&import_id).await {
                Ok(()) => StageOutcome::Succeeded(format!("import {import_id} queued")),
                Err(e) => StageOutcome::Failed(e.to_string()),
            }
        };
        report.push(Stage::ProcessImport, outcome);

        report
    }

    async fn upload_single(&self, client: &ImportClient, import_id: &str, report: &mut ProbeReport) {
        let outcome = match self.config.target_files.first() {
            None => StageOutcome::Skipped("no target files configured".to_string()),
            Some(file) if !file.exists() => {
                StageOutcome::Skipped(format!("{} not found", file.display()))
            }
            Some(file) => match client
                .upload_single_hash_last(import_id, file, &self.config.remote_path)
                .await
            {
                Ok(status) => StageOutcome::Succeeded(format!(
                    "{} accepted ({})",
                    file.display(),
                    status
                )),
                Err(e) => StageOutcome::Failed(e.to_string()),
            },
        };
        report.push(Stage::UploadSingle, outcome);
    }

    async fn upload_batch(
        &self,
        client: &ImportClient,
        import_id: &str,
        options: &RunOptions,
        report: &mut ProbeReport,
    ) {
        let files: &[PathBuf] = &self.config.target_files;

        if !options.batch {
            report.push(Stage::UploadBatch, StageOutcome::Skipped("disabled".to_string()));
            return;
        }
        if files.is_empty() {
            report.push(
                Stage::UploadBatch,
                StageOutcome::Skipped("no target files configured".to_string()),
            );
            return;
        }
        if let Some(missing) = files.iter().find(|f| !f.exists()) {
            report.push(
                Stage::UploadBatch,
                StageOutcome::Skipped(format!("{} not found", missing.display())),
            );
            return;
        }

        match client
            .upload_batch(import_id, files, &self.config.remote_path)
            .await
        {
            Ok(outcome) => {
                let detail = format!("{} files, server answered {}", files.len(), outcome.status);
                let stage_outcome = if outcome.accepted() {
                    StageOutcome::Succeeded(detail)
                } else {
                    StageOutcome::Failed(detail)
                };
                report.stages.push(StageReport {
                    stage: Stage::UploadBatch,
                    outcome: stage_outcome,
                    response_body: Some(outcome.body),
                });
            }
            Err(e) => report.push(Stage::UploadBatch, StageOutcome::Failed(e.to_string())),
        }
    }
}
