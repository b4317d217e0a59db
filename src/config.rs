//! Target and session configuration.
//!
//! Built-in targets can be extended or overridden by a targets file with
//! one entry per line:
//!
//! ```text
//! # name = ip:port, signature, encoding
//! Taiwan = 219.84.200.54:6900, c0a8, count
//! ```

use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::{ResponseEncoding, Target};
use crate::error::ConfigError;
use crate::session::SessionConfig;
use crate::utils::{hex, parse_host_port};

const DEFAULT_CONFIG_PATH: &str = "rosniff.conf";
const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct Config {
    /// Where the targets file was looked up
    pub config_path: PathBuf,
    pub targets: Vec<Target>,
    pub idle_timeout: Duration,
    pub log_filter: String,
}

impl Config {
    /// Load configuration.
    ///
    /// The targets file is `path` if given, else `ROSNIFF_CONFIG`, else
    /// `./rosniff.conf`. A missing file only means no custom targets.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("ROSNIFF_CONFIG").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut targets = builtin_targets();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            merge_targets(&mut targets, parse_targets(&content)?);
        }

        let mut idle_timeout = Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS);
        if let Ok(val) = std::env::var("ROSNIFF_IDLE_TIMEOUT_SECS") {
            let secs: u64 = val.parse().map_err(|_| ConfigError::InvalidValue {
                key: "ROSNIFF_IDLE_TIMEOUT_SECS".to_string(),
                value: val.clone(),
            })?;
            idle_timeout = Duration::from_secs(secs);
        }

        let log_filter =
            std::env::var("ROSNIFF_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Ok(Config {
            config_path,
            targets,
            idle_timeout,
            log_filter,
        })
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|target| target.name == name)
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            idle_timeout: self.idle_timeout,
            ..SessionConfig::default()
        }
    }

    pub fn tracing_filter(&self) -> &str {
        &self.log_filter
    }
}

/// Known login servers.
pub fn builtin_targets() -> Vec<Target> {
    vec![
        Target::new(
            "Taiwan",
            Ipv4Addr::new(219, 84, 200, 54),
            6900,
            vec![0xc0, 0xa8],
            ResponseEncoding::Count,
        ),
        Target::new(
            "Taiwan - Zero",
            Ipv4Addr::new(35, 229, 252, 108),
            6900,
            vec![0xc0, 0xa8],
            ResponseEncoding::Status,
        ),
    ]
}

/// Parse the targets file format.
pub fn parse_targets(content: &str) -> Result<Vec<Target>, ConfigError> {
    let mut targets = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line_no = index + 1;
        let (name, rest) = line.split_once('=').ok_or_else(|| ConfigError::InvalidLine {
            line: line_no,
            message: "expected 'name = ip:port, signature, encoding'".to_string(),
        })?;

        let name = name.trim();
        if name.is_empty() {
            return Err(ConfigError::InvalidLine {
                line: line_no,
                message: "empty target name".to_string(),
            });
        }

        let parts: Vec<&str> = rest.split(',').map(str::trim).collect();
        if parts.len() < 2 {
            return Err(ConfigError::InvalidLine {
                line: line_no,
                message: "missing signature".to_string(),
            });
        }

        let (address, port) = parse_host_port(parts[0])
            .ok_or_else(|| ConfigError::InvalidAddress(parts[0].to_string()))?;

        let signature = hex::decode(parts[1])
            .filter(|bytes| !bytes.is_empty())
            .ok_or_else(|| ConfigError::InvalidSignature(parts[1].to_string()))?;

        // Encoding defaults to a literal count
        let encoding = match parts.get(2) {
            Some(name) => ResponseEncoding::from_name(name)
                .ok_or_else(|| ConfigError::InvalidEncoding(name.to_string()))?,
            None => ResponseEncoding::Count,
        };

        targets.push(Target::new(name, address, port, signature, encoding));
    }

    Ok(targets)
}

/// Merge custom targets into `base`: same name replaces, new names append.
pub fn merge_targets(base: &mut Vec<Target>, custom: Vec<Target>) {
    for target in custom {
        match base.iter_mut().find(|existing| existing.name == target.name) {
            Some(existing) => *existing = target,
            None => base.push(target),
        }
    }
}
