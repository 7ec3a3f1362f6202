//! Config command implementation.

use std::path::{Path, PathBuf};

use anyhow::Result;
use handoff_core::config::Config;

use super::{handle_error, ConfigAction, ConfigArgs};

/// Run the config command.
pub async fn run(args: ConfigArgs) -> Result<()> {
    // Reset must work even when the current file no longer loads.
    match args.action {
        ConfigAction::Reset => return reset(&Config::config_path()),
        ConfigAction::Path => {
            println!("{}", Config::config_path().display());
            return Ok(());
        }
        _ => {}
    }

    let mut config = Config::load().inspect_err(handle_error)?;

    match args.action {
        ConfigAction::Get { key } => match get_config_value(&config, &key) {
            Some(v) => println!("{}: {}", key, v),
            None => println!("Unknown configuration key: {}", key),
        },

        ConfigAction::Set { key, value } => {
            if set_config_value(&mut config, &key, &value)? {
                config.validate().inspect_err(handle_error)?;
                config.save().inspect_err(handle_error)?;
                println!("Set {} = {}", key, value);
            } else {
                println!("Unknown configuration key: {}", key);
            }
        }

        ConfigAction::Show => {
            println!();
            println!("Handoff Configuration");
            println!("{}", "─".repeat(50));
            println!();
            println!("[api]");
            println!("  api_id = {}", config.api.api_id);
            println!("  api_hash = \"{}\"", mask(&config.api.api_hash));
            println!();
            println!("[handoff]");
            println!("  link_scheme = \"{}\"", config.handoff.link_scheme);
            println!("  sync_contacts = {}", config.handoff.sync_contacts);
            println!("  app_version = \"{}\"", config.handoff.app_version);
            println!();
            println!("[storage]");
            match &config.storage.accounts_path {
                Some(path) => println!("  accounts_path = \"{}\"", path.display()),
                None => println!("  # accounts_path = <default>"),
            }
            println!();
        }

        ConfigAction::Path | ConfigAction::Reset => {}
    }

    Ok(())
}

fn reset(path: &Path) -> Result<()> {
    Config::default().save_to(path).inspect_err(handle_error)?;
    println!("Configuration reset to defaults.");
    Ok(())
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "api_id" => Some(config.api.api_id.to_string()),
        "api_hash" => Some(config.api.api_hash.clone()),
        "link_scheme" => Some(config.handoff.link_scheme.clone()),
        "sync_contacts" => Some(config.handoff.sync_contacts.to_string()),
        "app_version" => Some(config.handoff.app_version.clone()),
        "accounts_path" => Some(
            config
                .storage
                .accounts_path
                .as_ref()
                .map_or_else(|| "<default>".to_string(), |p| p.display().to_string()),
        ),
        _ => None,
    }
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<bool> {
    match key {
        "api_id" => {
            config.api.api_id = value.parse()?;
            Ok(true)
        }
        "api_hash" => {
            config.api.api_hash = value.to_string();
            Ok(true)
        }
        "link_scheme" => {
            config.handoff.link_scheme = value.to_string();
            Ok(true)
        }
        "sync_contacts" => {
            config.handoff.sync_contacts = value.parse()?;
            Ok(true)
        }
        "app_version" => {
            config.handoff.app_version = value.to_string();
            Ok(true)
        }
        "accounts_path" => {
            config.storage.accounts_path = if value.is_empty() {
                None
            } else {
                Some(PathBuf::from(value))
            };
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Show only the first four characters of a secret.
fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return String::new();
    }
    let visible: String = secret.chars().take(4).collect();
    format!("{visible}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get_round_trip() {
        let mut config = Config::default();

        assert!(set_config_value(&mut config, "api_id", "2040").unwrap());
        assert!(set_config_value(&mut config, "sync_contacts", "false").unwrap());
        assert!(set_config_value(&mut config, "accounts_path", "/tmp/a.json").unwrap());

        assert_eq!(get_config_value(&config, "api_id").as_deref(), Some("2040"));
        assert_eq!(
            get_config_value(&config, "sync_contacts").as_deref(),
            Some("false")
        );
        assert_eq!(
            config.storage.accounts_path,
            Some(PathBuf::from("/tmp/a.json"))
        );
    }

    #[test]
    fn test_empty_accounts_path_restores_default() {
        let mut config = Config::default();
        config.storage.accounts_path = Some(PathBuf::from("/tmp/a.json"));

        assert!(set_config_value(&mut config, "accounts_path", "").unwrap());
        assert_eq!(
            get_config_value(&config, "accounts_path").as_deref(),
            Some("<default>")
        );
    }

    #[test]
    fn test_unknown_key() {
        let mut config = Config::default();
        assert!(!set_config_value(&mut config, "port", "80").unwrap());
        assert!(get_config_value(&config, "port").is_none());
    }

    #[test]
    fn test_invalid_value_is_error() {
        let mut config = Config::default();
        assert!(set_config_value(&mut config, "api_id", "abc").is_err());
        assert!(set_config_value(&mut config, "sync_contacts", "maybe").is_err());
    }

    #[test]
    fn test_reset_replaces_unloadable_config() {
        let tmp_dir = tempfile::TempDir::new().unwrap();
        let path = tmp_dir.path().join("config.toml");
        std::fs::write(&path, "[handoff]\nlink_scheme = \"1 bad\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        reset(&path).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.handoff.link_scheme, "tg");
    }

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "");
        assert_eq!(mask("b18441a1ff"), "b184…");
    }
}
