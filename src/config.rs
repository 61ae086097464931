//! Config for usbsniff binary
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use crate::decoder::payload::MAX_PAYLOAD_SIZE;
use crate::error::{Error, ErrorKind, Result};

const CONF_DIR: &str = "usbsniff";
const CONF_NAME: &str = "usbsniff.json";

/// Capture and output settings; every field is optional in the file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    /// Payloads longer than this are replaced by a notice
    pub max_payload_size: usize,
    /// Bytes captured per packet
    pub snaplen: i32,
    /// Capture read timeout in milliseconds
    pub timeout_ms: i32,
    /// Capture interface name without bus number
    pub interface_prefix: String,
    /// Disable coloured console output
    pub no_colour: bool,
    /// Run `modprobe usbmon` before opening the capture
    pub modprobe: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_payload_size: MAX_PAYLOAD_SIZE,
            snaplen: 65535,
            timeout_ms: 1000,
            interface_prefix: "usbmon".into(),
            no_colour: false,
            modprobe: false,
        }
    }
}

impl Config {
    /// Default new
    pub fn new() -> Config {
        Default::default()
    }

    /// Attempt to read from .json format config at `file_path`
    pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Config> {
        let f = File::open(file_path.as_ref()).map_err(|e| {
            Error::new(
                ErrorKind::Config,
                &format!(
                    "Failed to open config {}: {}",
                    file_path.as_ref().display(),
                    e
                ),
            )
        })?;
        let mut br = BufReader::new(f);
        let mut data = String::new();

        br.read_to_string(&mut data)?;
        Ok(serde_json::from_str::<Config>(&data)?)
    }

    /// Default location `$XDG_CONFIG_HOME/usbsniff/usbsniff.json` or platform equivalent
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONF_DIR).join(CONF_NAME))
    }

    /// Config from `file_path` if supplied, else the default location if it exists, else defaults
    pub fn load(file_path: Option<&Path>) -> Result<Config> {
        match file_path {
            Some(p) => Config::from_file(p),
            None => match Config::default_path() {
                Some(p) if p.exists() => {
                    log::debug!("Loading config from {}", p.display());
                    Config::from_file(p)
                }
                _ => Ok(Config::new()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial() {
        let config: Config =
            serde_json::from_str(r#"{"max-payload-size": 64, "modprobe": true}"#).unwrap();
        assert_eq!(config.max_payload_size, 64);
        assert!(config.modprobe);
        assert_eq!(config.interface_prefix, "usbmon");
        assert_eq!(config.snaplen, 65535);
    }

    #[test]
    fn test_deserialize_unknown_field() {
        assert!(serde_json::from_str::<Config>(r#"{"colour": "red"}"#).is_err());
    }

    #[test]
    fn test_serialize_deserialize() {
        let c = Config::new();
        let ser = serde_json::to_string_pretty(&c).unwrap();
        let crt: Config = serde_json::from_str(&ser).unwrap();
        assert_eq!(c, crt);
    }

    #[test]
    fn test_missing_file_config_error() {
        let err = Config::load(Some(Path::new("./tests/data/does_not_exist.json"))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
    }
}
