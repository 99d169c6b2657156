use crate::tabs::ChartSupport;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_DATA_PATH: &str = "data/transactions.json";
pub const DEFAULT_SAVINGS_DIR: &str = "data/local";
pub const DEFAULT_ASSETS_DIR: &str = "static";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must not be empty")]
    Empty { name: &'static str },
    #[error("invalid {name} value {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Runtime settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
    pub savings_dir: PathBuf,
    pub assets_dir: PathBuf,
    pub charts: ChartSupport,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => value.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        let charts = match lookup("APP_CHARTS").as_deref().map(str::trim) {
            None | Some("") | Some("plotly") => ChartSupport::Available,
            Some("off" | "none" | "0") => ChartSupport::Unavailable,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "APP_CHARTS",
                    value: other.to_string(),
                });
            }
        };

        Ok(Self {
            port,
            data_path: path_var(&lookup, "APP_DATA_PATH", DEFAULT_DATA_PATH)?,
            savings_dir: path_var(&lookup, "APP_SAVINGS_DIR", DEFAULT_SAVINGS_DIR)?,
            assets_dir: path_var(&lookup, "APP_ASSETS_DIR", DEFAULT_ASSETS_DIR)?,
            charts,
        })
    }
}

fn path_var(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
) -> Result<PathBuf, ConfigError> {
    match lookup(name) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty { name }),
        Some(value) => Ok(PathBuf::from(value)),
        None => Ok(PathBuf::from(default)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.data_path, PathBuf::from("data/transactions.json"));
        assert_eq!(config.savings_dir, PathBuf::from("data/local"));
        assert_eq!(config.assets_dir, PathBuf::from("static"));
        assert_eq!(config.charts, ChartSupport::Available);
    }

    #[test]
    fn overrides_are_read() {
        let config = config(&[
            ("PORT", "9090"),
            ("APP_DATA_PATH", "/tmp/tx.json"),
            ("APP_ASSETS_DIR", "/srv/static"),
            ("APP_CHARTS", "off"),
        ])
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.data_path, PathBuf::from("/tmp/tx.json"));
        assert_eq!(config.assets_dir, PathBuf::from("/srv/static"));
        assert_eq!(config.charts, ChartSupport::Unavailable);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(matches!(config(&[("PORT", "eighty")]), Err(ConfigError::Invalid { name: "PORT", .. })));
        assert!(matches!(config(&[("APP_CHARTS", "d3")]), Err(ConfigError::Invalid { .. })));
        assert!(matches!(
            config(&[("APP_DATA_PATH", "  ")]),
            Err(ConfigError::Empty { name: "APP_DATA_PATH" })
        ));
    }
}
