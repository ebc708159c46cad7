use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use url::Url;

use crate::auth::Credentials;
use crate::client;

pub const KEYRING_SERVICE: &str = "import-probe-client-secret";
pub const KEYRING_USER: &str = "ImportProbe";

pub const DEFAULT_BASE_URL: &str = "https://sleephq.com";
pub const DEFAULT_REMOTE_PATH: &str = "/";

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ConfigFile {
    pub base_url: Option<Url>,
    pub client_id: Option<String>,
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub target_files: Vec<PathBuf>,
    pub remote_path: Option<String>,
    pub insecure_tls: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigEnv {
    cloud_base_url: Option<Url>,
    cloud_client_id: Option<String>,
    cloud_client_secret: Option<String>,
    cloud_team_id: Option<String>,
    #[serde(default, deserialize_with = "crate::serde_utils::deserialize_optional_flag")]
    cloud_insecure_tls: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub base_url: Url,
    /// Skips the `/me` lookup when set.
    pub team_id: Option<String>,
    pub target_files: Vec<PathBuf>,
    pub remote_path: String,
    pub insecure_tls: bool,
}

fn merge_config(base: ConfigFile, override_config: ConfigEnv) -> Result<Config> {
    let base_url = match override_config.cloud_base_url.or(base.base_url) {
        Some(url) => client::api_root(url),
        None => Url::parse(DEFAULT_BASE_URL)?,
    };

    let client_id = override_config
        .cloud_client_id
        .or(base.client_id)
        .ok_or(anyhow!("No client ID provided"))?;

    let client_secret = if let Some(secret) = override_config.cloud_client_secret {
        secret
    } else {
        let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
        let secret = entry.get_secret().context(
            "Client secret not specified via environment variable nor present in OS keyring",
        )?;
        String::from_utf8(secret)?
    };

    Ok(Config {
        credentials: Credentials {
            client_id,
            client_secret,
        },
        base_url,
        team_id: override_config.cloud_team_id.or(base.team_id),
        target_files: base.target_files,
        remote_path: base
            .remote_path
            .unwrap_or_else(|| DEFAULT_REMOTE_PATH.to_string()),
        insecure_tls: override_config
            .cloud_insecure_tls
            .or(base.insecure_tls)
            .unwrap_or(false),
    })
}

fn config_file_path() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("com", "import-probe", "import-probe")
        .ok_or(anyhow!("Unable to determine home directory"))?;
    Ok(project_dirs.config_dir().join("config.toml"))
}

pub fn read_config_file() -> Result<ConfigFile> {
    let config_file = config_file_path()?;
    if let Ok(config) = fs::read_to_string(&config_file) {
        toml::from_str(&config)
            .with_context(|| format!("Invalid config file {}", config_file.display()))
    } else {
        Ok(ConfigFile::default())
    }
}

pub fn read_config() -> Result<Config> {
    let _ = dotenv();
    let env_config =
        envy::from_env::<ConfigEnv>().context("Invalid CLOUD_* environment variables")?;
    merge_config(read_config_file()?, env_config)
}

pub fn write_config(config: ConfigFile) -> Result<PathBuf> {
    let config_file = config_file_path()?;
    if let Some(parent) = config_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_file, toml::to_string(&config)?)?;
    Ok(config_file)
}

pub fn set_client_secret_keyring(client_secret: String) -> Result<()> {
    let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
    entry.set_secret(client_secret.as_bytes())?;
    println!("Client secret stored for use with import-probe");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with_secret() -> ConfigEnv {
        ConfigEnv {
            cloud_client_secret: Some("env-secret".to_string()),
            ..ConfigEnv::default()
        }
    }

    #[test]
    fn test_file_values_and_defaults() {
        let file: ConfigFile = toml::from_str(
            r#"
            client_id = "file-client"
            target_files = ["/sd/Identification.json", "/sd/Identification.crc"]
            "#,
        )
        .unwrap();

        let config = merge_config(file, env_with_secret()).unwrap();
        assert_eq!(config.base_url.as_str(), "https://sleephq.com/");
        assert_eq!(config.credentials.client_id, "file-client");
        assert_eq!(config.credentials.client_secret, "env-secret");
        assert_eq!(config.remote_path, "/");
        assert_eq!(config.team_id, None);
        assert!(!config.insecure_tls);
        assert_eq!(
            config.target_files,
            vec![
                PathBuf::from("/sd/Identification.json"),
                PathBuf::from("/sd/Identification.crc")
            ]
        );
    }

    #[test]
    fn test_env_overrides_file() {
        let file = ConfigFile {
            base_url: Some(Url::parse("https://file.example").unwrap()),
            client_id: Some("file-client".to_string()),
            team_id: Some("1".to_string()),
            insecure_tls: Some(false),
            ..ConfigFile::default()
        };
        let env = ConfigEnv {
            cloud_base_url: Some(Url::parse("https://env.example").unwrap()),
            cloud_client_id: Some("env-client".to_string()),
            cloud_team_id: Some("42".to_string()),
            cloud_insecure_tls: Some(true),
            ..env_with_secret()
        };

        let config = merge_config(file, env).unwrap();
        assert_eq!(config.base_url.as_str(), "https://env.example/");
        assert_eq!(config.credentials.client_id, "env-client");
        assert_eq!(config.team_id.as_deref(), Some("42"));
        assert!(config.insecure_tls);
    }

    fn env_from(vars: &[(&str, &str)]) -> ConfigEnv {
        envy::from_iter(
            vars.iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        )
        .unwrap()
    }

    #[test]
    fn test_env_insecure_tls_accepts_one_and_any_case() {
        let env = env_from(&[
            ("CLOUD_CLIENT_ID", "env-client"),
            ("CLOUD_CLIENT_SECRET", "env-secret"),
            ("CLOUD_TEAM_ID", "42"),
            ("CLOUD_INSECURE_TLS", "1"),
        ]);
        let config = merge_config(ConfigFile::default(), env).unwrap();
        assert_eq!(config.credentials.client_id, "env-client");
        assert_eq!(config.credentials.client_secret, "env-secret");
        assert_eq!(config.team_id.as_deref(), Some("42"));
        assert!(config.insecure_tls);

        let env = env_from(&[("CLOUD_INSECURE_TLS", "TRUE")]);
        assert_eq!(env.cloud_insecure_tls, Some(true));
        let env = env_from(&[("CLOUD_INSECURE_TLS", "0")]);
        assert_eq!(env.cloud_insecure_tls, Some(false));
        let env = env_from(&[("CLOUD_CLIENT_ID", "env-client")]);
        assert_eq!(env.cloud_insecure_tls, None);
    }

    #[test]
    fn test_env_false_flag_overrides_file() {
        let file = ConfigFile {
            client_id: Some("file-client".to_string()),
            insecure_tls: Some(true),
            ..ConfigFile::default()
        };
        let env = env_from(&[
            ("CLOUD_CLIENT_SECRET", "env-secret"),
            ("CLOUD_INSECURE_TLS", "False"),
        ]);
        let config = merge_config(file, env).unwrap();
        assert!(!config.insecure_tls);
    }

    #[test]
    fn test_invalid_env_is_reported() {
        let result = envy::from_iter::<_, ConfigEnv>(vec![(
            "CLOUD_BASE_URL".to_string(),
            "not a url".to_string(),
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_base_url_path_prefix_is_kept() {
        let env = env_from(&[
            ("CLOUD_BASE_URL", "https://host.example/proxy"),
            ("CLOUD_CLIENT_ID", "env-client"),
            ("CLOUD_CLIENT_SECRET", "env-secret"),
        ]);
        let config = merge_config(ConfigFile::default(), env).unwrap();
        assert_eq!(config.base_url.as_str(), "https://host.example/proxy/");
        assert_eq!(
            config.base_url.join("api/v1/me").unwrap().as_str(),
            "https://host.example/proxy/api/v1/me"
        );
    }

    #[test]
    fn test_missing_client_id() {
        let err = merge_config(ConfigFile::default(), env_with_secret()).unwrap_err();
        assert_eq!(err.to_string(), "No client ID provided");
    }

    #[test]
    fn test_config_file_round_trip_omits_empty_targets() {
        let file = ConfigFile {
            client_id: Some("abc".to_string()),
            ..ConfigFile::default()
        };
        let written = toml::to_string(&file).unwrap();
        assert!(!written.contains("target_files"));
        let read: ConfigFile = toml::from_str(&written).unwrap();
        assert_eq!(read.client_id.as_deref(), Some("abc"));
    }
}
