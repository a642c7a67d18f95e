// Device configuration loaded from JSON files or built in code.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, ErrorKind};
use crate::core::ring::DEFAULT_CAPACITY;

#[derive(Clone, Debug, Deserialize, Serialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Number of record slots in the ring.
    pub capacity: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl DeviceConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn from_json_str(text: &str) -> Result<Self, Error> {
        let config: Self = serde_json::from_str(text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message("invalid device config")
                .with_hint("Expected a JSON object like {\"capacity\": 10}.")
                .with_source(err)
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to read config {}", path.display()))
                .with_source(err)
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.capacity == 0 {
            return Err(Error::new(ErrorKind::InvalidArgument)
                .with_message("capacity must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::DeviceConfig;
    use crate::core::error::ErrorKind;
    use std::io::Write;

    #[test]
    fn missing_fields_take_defaults() {
        let config = DeviceConfig::from_json_str("{}").expect("config");
        assert_eq!(config.capacity, 10);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = DeviceConfig::from_json_str(r#"{"capacity": 4, "slots": 2}"#).expect_err("unknown");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let err = DeviceConfig::from_json_str(r#"{"capacity": 0}"#).expect_err("zero");
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(br#"{"capacity": 3}"#).expect("write");
        let config = DeviceConfig::load(file.path()).expect("load");
        assert_eq!(config, DeviceConfig::with_capacity(3));
    }

    #[test]
    fn load_missing_file_is_io() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = DeviceConfig::load(dir.path().join("absent.json")).expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
