//! TOML configuration file parsing
//!
//! Every key is optional; missing keys keep the `DeviceConfig::default()`
//! value. Sizes may be plain numbers, hex (`0x40000`) or suffixed strings
//! (`"256 KiB"`, `"64 MiB"`).

use std::fs;
use std::path::Path;
use std::string::{String, ToString};
use std::format;

use thiserror::Error;

use super::{DeviceConfig, Geometry, InitConfig, PollConfig};
use crate::bus::BusConfig;

/// Errors from loading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the file
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path of the configuration file
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or has unexpected keys
    #[error("invalid configuration: {0}")]
    Parse(#[from] ::toml::de::Error),

    /// The resulting geometry violates the block device invariants
    #[error("invalid configuration: {0}")]
    Invalid(#[from] crate::error::Error),
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlConfigFile {
    #[serde(default, deserialize_with = "deserialize_opt_size")]
    reserved_offset: Option<u32>,
    strict_status: Option<bool>,
    geometry: Option<TomlGeometry>,
    poll: Option<TomlPoll>,
    bus: Option<BusConfig>,
    init: Option<TomlInit>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlGeometry {
    #[serde(default, deserialize_with = "deserialize_opt_size")]
    size: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_opt_size")]
    read_size: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_opt_size")]
    program_size: Option<u32>,
    #[serde(default, deserialize_with = "deserialize_opt_size")]
    erase_size: Option<u32>,
    erase_value: Option<u8>,
    #[serde(default, deserialize_with = "deserialize_opt_size")]
    write_buffer_size: Option<u32>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlPoll {
    interval_us: Option<u32>,
    max_polls: Option<u32>,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct TomlInit {
    vcr: Option<u16>,
    verify: Option<bool>,
}

/// Deserialize an optional size that can be an integer or a size string
fn deserialize_opt_size<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::Deserialize;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SizeOrStr {
        Int(u32),
        Str(String),
    }

    match Option::<SizeOrStr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(SizeOrStr::Int(n)) => Ok(Some(n)),
        Some(SizeOrStr::Str(s)) => parse_size(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Parse a size string like "64 MiB", "0x40000" or "4096"
pub fn parse_size(s: &str) -> Result<u32, String> {
    let s = s.trim();

    if let Ok(n) = s.parse::<u32>() {
        return Ok(n);
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u32::from_str_radix(hex.trim(), 16).map_err(|e| format!("invalid hex: {}", e));
    }

    let s_lower = s.to_lowercase();
    let (num_str, multiplier) = if let Some(n) = s_lower.strip_suffix("mib") {
        (n.trim(), 1024 * 1024)
    } else if let Some(n) = s_lower.strip_suffix("kib") {
        (n.trim(), 1024)
    } else if let Some(n) = s_lower.strip_suffix('b') {
        (n.trim(), 1)
    } else {
        return Err(format!("invalid size: {}", s));
    };

    let num: u32 = num_str.parse().map_err(|_| format!("invalid size: {}", s))?;
    num.checked_mul(multiplier)
        .ok_or_else(|| format!("size too large: {}", s))
}

impl DeviceConfig {
    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: TomlConfigFile = ::toml::from_str(content)?;
        let mut cfg = DeviceConfig::default();

        if let Some(offset) = file.reserved_offset {
            cfg.reserved_offset = offset;
        }
        if let Some(strict) = file.strict_status {
            cfg.strict_status = strict;
        }

        if let Some(g) = file.geometry {
            let d = Geometry::default();
            cfg.geometry = Geometry {
                size: g.size.unwrap_or(d.size),
                read_size: g.read_size.unwrap_or(d.read_size),
                program_size: g.program_size.unwrap_or(d.program_size),
                erase_size: g.erase_size.unwrap_or(d.erase_size),
                erase_value: g.erase_value.unwrap_or(d.erase_value),
                write_buffer_size: g.write_buffer_size.unwrap_or(d.write_buffer_size),
            };
        }

        if let Some(p) = file.poll {
            cfg.poll = PollConfig {
                interval_us: p.interval_us.unwrap_or(PollConfig::DEFAULT.interval_us),
                max_polls: p.max_polls.unwrap_or(PollConfig::DEFAULT.max_polls),
            };
        }

        if let Some(bus) = file.bus {
            cfg.bus = bus;
        }

        if let Some(init) = file.init {
            let d = InitConfig::default();
            cfg.init = InitConfig {
                vcr: init.vcr.unwrap_or(d.vcr),
                verify: init.verify.unwrap_or(d.verify),
            };
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("512").unwrap(), 512);
        assert_eq!(parse_size("0x40000").unwrap(), 256 * 1024);
        assert_eq!(parse_size("256 KiB").unwrap(), 256 * 1024);
        assert_eq!(parse_size("256KiB").unwrap(), 256 * 1024);
        assert_eq!(parse_size("64 MiB").unwrap(), 64 * 1024 * 1024);
        assert!(parse_size("64 parsecs").is_err());
        assert!(parse_size("8192 MiB").is_err());
    }

    #[test]
    fn test_empty_file_is_default() {
        let cfg = DeviceConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, DeviceConfig::default());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
reserved_offset = "128 KiB"
strict_status = true

[geometry]
size = "32 MiB"
erase_size = "128 KiB"

[poll]
max_polls = 50

[bus.timing]
latency = 2

[init]
vcr = 0x8E1B
verify = true
"#;
        let cfg = DeviceConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.reserved_offset, 128 * 1024);
        assert!(cfg.strict_status);
        assert_eq!(cfg.geometry.size, 32 * 1024 * 1024);
        assert_eq!(cfg.geometry.erase_size, 128 * 1024);
        assert_eq!(cfg.geometry.program_size, 2);
        assert_eq!(cfg.poll.max_polls, 50);
        assert_eq!(cfg.poll.interval_us, 1000);
        assert_eq!(cfg.bus.timing.latency, 2);
        assert_eq!(cfg.bus.timing.cs_high, 4);
        assert_eq!(cfg.bus.max_transfer_len, 0x1FF);
        assert_eq!(cfg.init.vcr, 0x8E1B);
        assert!(cfg.init.verify);
    }

    #[test]
    fn test_rejects_bad_geometry() {
        let toml = r#"
[geometry]
program_size = 3
"#;
        assert!(matches!(
            DeviceConfig::from_toml_str(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(matches!(
            DeviceConfig::from_toml_str("page_size = 256"),
            Err(ConfigError::Parse(_))
        ));
    }
}
