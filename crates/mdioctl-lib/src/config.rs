//! Tool configuration: TOML-based, platform-aware paths.
//!
//! Holds the defaults the command line falls back to when a flag is absent.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::protocol::{DEFAULT_PHY, DEFAULT_PID, DEFAULT_VID, MDIO_MAX_ADDR, USB_TIMEOUT_MS};

/// Header comment prepended to saved config files.
const CONFIG_HEADER: &str = "# mdioctl configuration. Command-line flags override these values.\n\n";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// USB vendor ID of the adapter. Default: 0x1209.
    #[serde(default = "default_vendor_id")]
    pub vendor_id: u16,

    /// USB product ID of the adapter. Default: 0x0001.
    #[serde(default = "default_product_id")]
    pub product_id: u16,

    /// PHY address on the MDIO bus (0-31). Default: 1.
    #[serde(default = "default_phy")]
    pub phy: u8,

    /// Timeout per control transfer in milliseconds. Default: 1000.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_vendor_id() -> u16 {
    DEFAULT_VID
}
fn default_product_id() -> u16 {
    DEFAULT_PID
}
fn default_phy() -> u8 {
    DEFAULT_PHY
}
fn default_timeout_ms() -> u64 {
    USB_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            vendor_id: default_vendor_id(),
            product_id: default_product_id(),
            phy: default_phy(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

/// Validation errors that [`Config::validate`] can return.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// `phy` is not a 5-bit MDIO address.
    InvalidPhy(u8),
    /// `timeout_ms` is zero (transfers must be bounded but non-zero).
    ZeroTimeout,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidPhy(p) => write!(f, "Invalid phy index: {p} (must be 0-31)"),
            ValidationError::ZeroTimeout => write!(f, "timeout_ms must be greater than 0"),
        }
    }
}

impl Config {
    /// Platform-specific config directory.
    pub fn dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mdioctl"))
    }

    /// Full path to config file.
    pub fn path() -> Option<PathBuf> {
        Self::dir().map(|d| d.join("config.toml"))
    }

    /// Load config from disk, or return defaults if not found.
    pub fn load() -> Self {
        let (config, warnings) = Self::load_with_warnings();
        for w in &warnings {
            log::warn!("{w}");
        }
        config
    }

    /// Read config from `path`, failing if the file cannot be read.
    ///
    /// A file that reads but doesn't parse gives `(defaults, [warning])`.
    pub fn read_from(path: &Path) -> std::io::Result<(Self, Vec<String>)> {
        let contents = std::fs::read_to_string(path)?;
        match toml::from_str(&contents) {
            Ok(config) => Ok((config, vec![])),
            Err(e) => {
                let warning = format!(
                    "config parse error ({}), using defaults: {e}",
                    path.display()
                );
                Ok((Self::default(), vec![warning]))
            }
        }
    }

    /// Load config from an arbitrary path, returning the config and any warnings.
    ///
    /// Returns `(defaults, [])` if the file doesn't exist.
    /// Returns `(defaults, [warning])` if the file can't be read or parsed.
    pub fn load_from(path: &Path) -> (Self, Vec<String>) {
        match Self::read_from(path) {
            Ok(loaded) => loaded,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (Self::default(), vec![]),
            Err(e) => {
                let warning = format!(
                    "config read error ({}), using defaults: {e}",
                    path.display()
                );
                (Self::default(), vec![warning])
            }
        }
    }

    /// Load config from the default path, returning the config and any parse warnings.
    pub fn load_with_warnings() -> (Self, Vec<String>) {
        let Some(path) = Self::path() else {
            return (Self::default(), vec![]);
        };
        Self::load_from(&path)
    }

    /// Save config to an arbitrary path atomically (write to temp file, then rename).
    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let serialized = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        let contents = format!("{CONFIG_HEADER}{serialized}");
        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, &contents)?;
        match std::fs::rename(&tmp, path) {
            Ok(()) => Ok(()),
            Err(_) => {
                // Rename can fail across filesystems; fall back to direct write + cleanup
                let result = std::fs::write(path, &contents);
                let _ = std::fs::remove_file(&tmp);
                result
            }
        }
    }

    /// Validate the entire config, collecting all errors.
    pub fn validate(&self) -> std::result::Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        if self.phy > MDIO_MAX_ADDR {
            errors.push(ValidationError::InvalidPhy(self.phy));
        }
        if self.timeout_ms == 0 {
            errors.push(ValidationError::ZeroTimeout);
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let c = Config::default();
        assert_eq!(c.vendor_id, 0x1209);
        assert_eq!(c.product_id, 0x0001);
        assert_eq!(c.phy, 1);
        assert_eq!(c.timeout_ms, 1000);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: Config = toml::from_str("phy = 3\n").unwrap();
        assert_eq!(c.phy, 3);
        assert_eq!(c.vendor_id, DEFAULT_VID);
        assert_eq!(c.timeout_ms, USB_TIMEOUT_MS);
    }

    #[test]
    fn hex_literals_accepted() {
        let c: Config = toml::from_str("vendor_id = 0x1d50\nproduct_id = 0x6018\n").unwrap();
        assert_eq!(c.vendor_id, 0x1d50);
        assert_eq!(c.product_id, 0x6018);
    }

    #[test]
    fn empty_toml_is_default() {
        let c: Config = toml::from_str("").unwrap();
        assert_eq!(c, Config::default());
    }

    #[test]
    fn validate_default_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_collects_multiple_errors() {
        let c = Config {
            phy: 40,
            timeout_ms: 0,
            ..Config::default()
        };
        let errors = c.validate().unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidPhy(40), ValidationError::ZeroTimeout]
        );
    }

    #[test]
    fn validation_error_display() {
        assert_eq!(
            ValidationError::InvalidPhy(40).to_string(),
            "Invalid phy index: 40 (must be 0-31)"
        );
    }

    #[test]
    fn save_to_load_from_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("config.toml");
        let c = Config {
            vendor_id: 0xCAFE,
            product_id: 0x0042,
            phy: 7,
            timeout_ms: 250,
        };
        c.save_to(&path).unwrap();
        let (loaded, warnings) = Config::load_from(&path);
        assert!(warnings.is_empty());
        assert_eq!(loaded, c);
    }

    #[test]
    fn save_to_includes_header_comment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::default().save_to(&path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# mdioctl configuration"));
    }

    #[test]
    fn save_to_cleans_up_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::default().save_to(&path).unwrap();
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn load_from_missing_file_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let (c, warnings) = Config::load_from(&dir.path().join("nope.toml"));
        assert_eq!(c, Config::default());
        assert!(warnings.is_empty());
    }

    #[test]
    fn load_from_invalid_toml_returns_defaults_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "phy = \"one\"").unwrap();
        let (c, warnings) = Config::load_from(&path);
        assert_eq!(c, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("config parse error"));
    }

    #[test]
    fn read_from_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::read_from(&dir.path().join("board.tmol")).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[test]
    fn read_from_directory_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::read_from(dir.path()).is_err());
    }

    #[test]
    fn load_from_unreadable_path_warns() {
        let dir = tempfile::tempdir().unwrap();
        let (c, warnings) = Config::load_from(dir.path());
        assert_eq!(c, Config::default());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("config read error"));
    }

    #[test]
    fn out_of_range_u16_is_parse_error() {
        assert!(toml::from_str::<Config>("vendor_id = 70000").is_err());
    }
}
