//! Application settings shared by all stages.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::PreingestError;

/// Settings for the data folder and the external validation services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreingestSettings {
    /// Root folder holding one sub-folder per session.
    #[serde(default = "default_data_folder")]
    pub data_folder_name: PathBuf,
    /// Host of the schema/Schematron validation service.
    #[serde(default = "default_localhost")]
    pub xslweb_server_name: String,
    /// Port of the schema/Schematron validation service.
    #[serde(default = "default_xslweb_port")]
    pub xslweb_server_port: u16,
    /// Host of the utilities service (vocabulary lookup, macro scan).
    #[serde(default = "default_localhost")]
    pub utilities_server_name: String,
    /// Port of the utilities service.
    #[serde(default = "default_utilities_port")]
    pub utilities_server_port: u16,
    /// Timeout for the vocabulary lookup. `None` waits indefinitely.
    #[serde(default)]
    pub vocabulary_timeout_seconds: Option<f64>,
}

fn default_data_folder() -> PathBuf {
    PathBuf::from("/data")
}

fn default_localhost() -> String {
    "localhost".to_string()
}

fn default_xslweb_port() -> u16 {
    8000
}

fn default_utilities_port() -> u16 {
    8001
}

impl Default for PreingestSettings {
    fn default() -> Self {
        Self {
            data_folder_name: default_data_folder(),
            xslweb_server_name: default_localhost(),
            xslweb_server_port: default_xslweb_port(),
            utilities_server_name: default_localhost(),
            utilities_server_port: default_utilities_port(),
            vocabulary_timeout_seconds: None,
        }
    }
}

impl PreingestSettings {
    /// Creates settings with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads settings from a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, PreingestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Overlays `PREINGEST_*` environment variables on the defaults.
    pub fn from_env() -> Result<Self, PreingestError> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    fn overlay(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, PreingestError> {
        if let Some(v) = lookup("PREINGEST_DATA_FOLDER") {
            self.data_folder_name = PathBuf::from(v);
        }
        if let Some(v) = lookup("PREINGEST_XSLWEB_SERVER") {
            self.xslweb_server_name = v;
        }
        if let Some(v) = lookup("PREINGEST_XSLWEB_PORT") {
            self.xslweb_server_port = parse_port("PREINGEST_XSLWEB_PORT", &v)?;
        }
        if let Some(v) = lookup("PREINGEST_UTILITIES_SERVER") {
            self.utilities_server_name = v;
        }
        if let Some(v) = lookup("PREINGEST_UTILITIES_PORT") {
            self.utilities_server_port = parse_port("PREINGEST_UTILITIES_PORT", &v)?;
        }
        if let Some(v) = lookup("PREINGEST_VOCABULARY_TIMEOUT") {
            let seconds = v.parse::<f64>().map_err(|_| {
                PreingestError::Configuration(format!(
                    "PREINGEST_VOCABULARY_TIMEOUT is not a number: '{v}'"
                ))
            })?;
            self.vocabulary_timeout_seconds = Some(seconds);
        }
        Ok(self)
    }

    /// Sets the data folder.
    #[must_use]
    pub fn with_data_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.data_folder_name = folder.into();
        self
    }

    /// Sets the schema validation service address.
    #[must_use]
    pub fn with_xslweb(mut self, server: impl Into<String>, port: u16) -> Self {
        self.xslweb_server_name = server.into();
        self.xslweb_server_port = port;
        self
    }

    /// Sets the utilities service address.
    #[must_use]
    pub fn with_utilities(mut self, server: impl Into<String>, port: u16) -> Self {
        self.utilities_server_name = server.into();
        self.utilities_server_port = port;
        self
    }

    /// Bounds the vocabulary lookup.
    #[must_use]
    pub fn with_vocabulary_timeout(mut self, seconds: f64) -> Self {
        self.vocabulary_timeout_seconds = Some(seconds);
        self
    }

    /// Base URL of the schema validation service.
    #[must_use]
    pub fn xslweb_base_url(&self) -> String {
        format!("http://{}:{}", self.xslweb_server_name, self.xslweb_server_port)
    }

    /// Base URL of the utilities service.
    #[must_use]
    pub fn utilities_base_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.utilities_server_name, self.utilities_server_port
        )
    }

    /// Gets the vocabulary timeout as a Duration.
    #[must_use]
    pub fn vocabulary_timeout(&self) -> Option<Duration> {
        self.vocabulary_timeout_seconds
            .filter(|s| *s > 0.0)
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16, PreingestError> {
    value
        .parse::<u16>()
        .map_err(|_| PreingestError::Configuration(format!("{key} is not a valid port: '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let settings = PreingestSettings::default();
        assert_eq!(settings.data_folder_name, PathBuf::from("/data"));
        assert_eq!(settings.xslweb_base_url(), "http://localhost:8000");
        assert!(settings.vocabulary_timeout().is_none());
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let settings =
            PreingestSettings::from_json_str(r#"{"xslweb_server_name": "xslweb", "xslweb_server_port": 9090}"#)
                .unwrap();
        assert_eq!(settings.xslweb_base_url(), "http://xslweb:9090");
        assert_eq!(settings.utilities_server_port, 8001);
    }

    #[test]
    fn test_overlay_reads_variables() {
        let vars: HashMap<&str, &str> = [
            ("PREINGEST_DATA_FOLDER", "/srv/preingest"),
            ("PREINGEST_UTILITIES_SERVER", "utils"),
            ("PREINGEST_UTILITIES_PORT", "7000"),
            ("PREINGEST_VOCABULARY_TIMEOUT", "2.5"),
        ]
        .into_iter()
        .collect();

        let settings = PreingestSettings::default()
            .overlay(|k| vars.get(k).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(settings.data_folder_name, PathBuf::from("/srv/preingest"));
        assert_eq!(settings.utilities_base_url(), "http://utils:7000");
        assert_eq!(settings.vocabulary_timeout(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_overlay_rejects_bad_port() {
        let result = PreingestSettings::default().overlay(|k| {
            (k == "PREINGEST_XSLWEB_PORT").then(|| "not-a-port".to_string())
        });
        assert!(matches!(result, Err(PreingestError::Configuration(_))));
    }

    #[test]
    fn test_builder_setters() {
        let settings = PreingestSettings::new()
            .with_data_folder("/tmp/data")
            .with_xslweb("validator", 81)
            .with_vocabulary_timeout(0.0);

        assert_eq!(settings.xslweb_base_url(), "http://validator:81");
        // A zero timeout is treated as unbounded.
        assert!(settings.vocabulary_timeout().is_none());
    }

    #[test]
    fn test_out_of_range_timeout_is_unbounded() {
        for seconds in [1e300, f64::INFINITY, f64::NAN, -3.0] {
            let settings = PreingestSettings::new().with_vocabulary_timeout(seconds);
            assert!(settings.vocabulary_timeout().is_none(), "{seconds}");
        }
    }
}
