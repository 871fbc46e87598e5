/// Runtime configuration
///
/// Values come from CLI flags first, then environment variables, then defaults.
use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_STATUS_URL: &str = "https://members.cssa.club/commonRoom/status";
pub const DEFAULT_POLL_SECS: u64 = 5;
pub const DEFAULT_DATA_DIR: &str = ".doorwatch";

#[derive(Debug, Clone)]
pub struct Config {
    /// Holds `door.sqlite` and `logs/`
    pub data_dir: PathBuf,
    pub status_url: Url,
    pub poll_interval: Duration,
}

impl Config {
    pub fn resolve(
        data_dir: Option<PathBuf>,
        status_url: Option<String>,
        poll_secs: Option<u64>,
    ) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => resolve_data_root(),
        };

        let status_url = status_url
            .or_else(|| env::var("DOORWATCH_STATUS_URL").ok())
            .unwrap_or_else(|| DEFAULT_STATUS_URL.to_string());
        let status_url = Url::parse(&status_url)
            .with_context(|| format!("Invalid status URL: {}", status_url))?;

        let poll_secs = match poll_secs {
            Some(secs) => secs,
            None => match env::var("DOORWATCH_POLL_SECS") {
                Ok(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("Invalid DOORWATCH_POLL_SECS: {}", raw))?,
                Err(_) => DEFAULT_POLL_SECS,
            },
        };
        if poll_secs == 0 {
            anyhow::bail!("Poll interval must be at least one second");
        }

        Ok(Self {
            data_dir,
            status_url,
            poll_interval: Duration::from_secs(poll_secs),
        })
    }
}

/// Data directory from `DOORWATCH_DATA_DIR`, defaulting to `.doorwatch`.
pub fn resolve_data_root() -> PathBuf {
    env::var_os("DOORWATCH_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_win() {
        let config = Config::resolve(
            Some(PathBuf::from("/tmp/door")),
            Some("http://localhost:8080/status".to_string()),
            Some(10),
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/door"));
        assert_eq!(config.status_url.as_str(), "http://localhost:8080/status");
        assert_eq!(config.poll_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::resolve(None, Some("not a url".to_string()), Some(5)).is_err());
        assert!(Config::resolve(None, Some(DEFAULT_STATUS_URL.to_string()), Some(0)).is_err());
    }
}
