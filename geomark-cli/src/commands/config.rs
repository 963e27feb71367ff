//! Configuration commands: `config get`, `config set`, `config list` and `config path`.

use clap::Subcommand;
use geomark::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., proximity.radius_m)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., proximity.radius_m)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => {
            let config = ConfigFile::load()?;
            println!("{}", get_value(&config, &key)?);
            Ok(())
        }
        ConfigCommands::Set { key, value } => {
            let mut config = ConfigFile::load()?;
            let key = set_value(&mut config, &key, &value)?;
            config.save()?;
            println!("Set {} = {}", key.name(), key.get(&config));
            Ok(())
        }
        ConfigCommands::List => {
            let config = ConfigFile::load()?;
            print!("{}", render_list(&config));
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", config_file_path().display());
            Ok(())
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'geomark config list' to see available keys.",
            key
        ))
    })
}

fn get_value(config: &ConfigFile, key: &str) -> Result<String, CliError> {
    let value = parse_key(key)?.get(config);
    Ok(if value.is_empty() {
        "(not set)".to_string()
    } else {
        value
    })
}

fn set_value(config: &mut ConfigFile, key: &str, value: &str) -> Result<ConfigKey, CliError> {
    let key = parse_key(key)?;
    key.set(config, value)?;
    Ok(key)
}

fn render_list(config: &ConfigFile) -> String {
    let mut out = String::new();
    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            if !current_section.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("[{}]\n", section));
            current_section = section;
        }

        let value = key.get(config);
        let value = if value.is_empty() { "(not set)" } else { value.as_str() };
        out.push_str(&format!("  {} = {}\n", key.key_name(), value));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_key_mentions_list_command() {
        let err = get_value(&ConfigFile::default(), "proximity.colour").unwrap_err();
        assert!(err.to_string().contains("geomark config list"));
    }

    #[test]
    fn test_set_then_get() {
        let mut config = ConfigFile::default();
        set_value(&mut config, "proximity.radius_m", "250").unwrap();
        assert_eq!(get_value(&config, "proximity.radius_m").unwrap(), "250");
    }

    #[test]
    fn test_set_rejects_invalid_value() {
        let mut config = ConfigFile::default();
        let err = set_value(&mut config, "proximity.radius_m", "-5").unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_list_groups_by_section() {
        let listing = render_list(&ConfigFile::default());
        for section in ["[location]", "[proximity]", "[store]", "[logging]"] {
            assert!(listing.contains(section), "missing {}", section);
        }
        assert!(listing.contains("  radius_m = "));
    }
}
