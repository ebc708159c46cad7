use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// One rejected token request, kept for the final [`ProbeError::Auth`] report.
#[derive(Debug, Clone)]
pub struct AttemptFailure {
    pub strategy: &'static str,
    pub reason: String,
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("all {} token attempts were rejected: {}", .attempts.len(), summarize(.attempts))]
    Auth { attempts: Vec<AttemptFailure> },

    #[error("failed to resolve current team: {status} - {body}")]
    Resolution { status: StatusCode, body: String },

    #[error("failed to create import: {status} - {body}")]
    SessionCreation { status: StatusCode, body: String },

    #[error("upload rejected: {status} - {body}")]
    Upload { status: StatusCode, body: String },

    #[error("failed to process import: {status} - {body}")]
    Processing { status: StatusCode, body: String },

    #[error("unable to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

fn summarize(attempts: &[AttemptFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("[{}] {}", a.strategy, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_error_lists_every_attempt() {
        let err = ProbeError::Auth {
            attempts: vec![
                AttemptFailure {
                    strategy: "scope=read+write",
                    reason: "401 Unauthorized".to_string(),
                },
                AttemptFailure {
                    strategy: "no scope",
                    reason: "400 Bad Request".to_string(),
                },
            ],
        };

        assert_eq!(
            err.to_string(),
            "all 2 token attempts were rejected: [scope=read+write] 401 Unauthorized; [no scope] 400 Bad Request"
        );
    }

    #[test]
    fn test_status_errors_include_body() {
        let err = ProbeError::Upload {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: "{\"errors\":[]}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "upload rejected: 422 Unprocessable Entity - {\"errors\":[]}"
        );
    }
}
