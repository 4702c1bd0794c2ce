//! Layered connection settings: defaults, then the user config file, then
//! environment variables, then CLI flags.

use std::{fs, path::PathBuf};

use anyhow::{bail, Result};
use clap::Args;
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "http://127.0.0.1:4943";

#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// Replica or gateway URL.
    #[arg(long)]
    pub host: Option<String>,
    /// Target canister id in textual form.
    #[arg(long)]
    pub canister_id: Option<String>,
    /// PEM file with an Ed25519 or secp256k1 identity; anonymous when omitted.
    #[arg(long)]
    pub identity_pem: Option<PathBuf>,
    /// Fetch the replica root key before calling (implied for loopback hosts).
    #[arg(long)]
    pub fetch_root_key: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct FileSettings {
    pub host: Option<String>,
    pub canister_id: Option<String>,
    pub identity_pem: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct EnvOverrides {
    pub host: Option<String>,
    pub canister_id: Option<String>,
    pub identity_pem: Option<PathBuf>,
}

#[derive(Debug)]
pub struct Settings {
    pub host: String,
    pub canister_id: String,
    pub identity_pem: Option<PathBuf>,
    pub fetch_root_key: bool,
}

pub fn load_settings(args: &ConnectionArgs) -> Result<Settings> {
    let file = read_config_file();
    let env = EnvOverrides {
        host: std::env::var("MEDREC_HOST").ok(),
        canister_id: std::env::var("MEDREC_CANISTER_ID").ok(),
        identity_pem: std::env::var("MEDREC_IDENTITY_PEM").ok().map(PathBuf::from),
    };
    merge(file, env, args)
}

fn read_config_file() -> FileSettings {
    let Some(path) = dirs::config_dir().map(|dir| dir.join("medrec").join("config.toml")) else {
        return FileSettings::default();
    };
    let Ok(raw) = fs::read_to_string(&path) else {
        return FileSettings::default();
    };
    match toml::from_str(&raw) {
        Ok(settings) => settings,
        Err(err) => {
            tracing::warn!("ignoring malformed config file {}: {err}", path.display());
            FileSettings::default()
        }
    }
}

pub fn merge(file: FileSettings, env: EnvOverrides, args: &ConnectionArgs) -> Result<Settings> {
    let host = args
        .host
        .clone()
        .or(env.host)
        .or(file.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let Some(canister_id) = args
        .canister_id
        .clone()
        .or(env.canister_id)
        .or(file.canister_id)
    else {
        bail!(
            "no canister id configured; pass --canister-id, set MEDREC_CANISTER_ID, \
             or add canister_id to the config file"
        );
    };

    let identity_pem = args
        .identity_pem
        .clone()
        .or(env.identity_pem)
        .or(file.identity_pem);

    Ok(Settings {
        fetch_root_key: args.fetch_root_key || client_core::host_is_local(&host),
        host,
        canister_id,
        identity_pem,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANISTER_ID: &str = "uxrrr-q7777-77774-qaaaq-cai";

    #[test]
    fn defaults_apply_when_nothing_is_configured() {
        let args = ConnectionArgs {
            canister_id: Some(CANISTER_ID.to_string()),
            ..ConnectionArgs::default()
        };
        let settings = merge(FileSettings::default(), EnvOverrides::default(), &args).unwrap();
        assert_eq!(settings.host, DEFAULT_HOST);
        assert!(settings.fetch_root_key, "loopback default implies root key fetch");
    }

    #[test]
    fn flags_override_env_which_overrides_file() {
        let file = FileSettings {
            host: Some("http://file.invalid".to_string()),
            canister_id: Some("from-file".to_string()),
            identity_pem: None,
        };
        let env = EnvOverrides {
            host: Some("http://env.invalid".to_string()),
            canister_id: None,
            identity_pem: None,
        };
        let args = ConnectionArgs {
            host: Some("https://icp0.io".to_string()),
            canister_id: Some(CANISTER_ID.to_string()),
            ..ConnectionArgs::default()
        };
        let settings = merge(file, env, &args).unwrap();
        assert_eq!(settings.host, "https://icp0.io");
        assert_eq!(settings.canister_id, CANISTER_ID);
        assert!(!settings.fetch_root_key, "never implied for remote hosts");
    }

    #[test]
    fn missing_canister_id_is_an_error() {
        let err = merge(
            FileSettings::default(),
            EnvOverrides::default(),
            &ConnectionArgs::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("no canister id configured"));
    }

    #[test]
    fn explicit_flag_forces_root_key_fetch_on_remote_hosts() {
        let args = ConnectionArgs {
            host: Some("https://testnet.example".to_string()),
            canister_id: Some(CANISTER_ID.to_string()),
            fetch_root_key: true,
            ..ConnectionArgs::default()
        };
        let settings = merge(FileSettings::default(), EnvOverrides::default(), &args).unwrap();
        assert!(settings.fetch_root_key);
    }
}
