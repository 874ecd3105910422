//! Configuration loading and validation

mod schema;

pub use schema::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG: &str = "solarstatconf.json";

/// Load configuration from a JSON file, or YAML for `.yaml`/`.yml` files
pub fn load_config(path: &Path) -> Result<SolarStatsConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let config: SolarStatsConfig = if is_yaml {
        serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse {:?}", path))?
    } else {
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {:?}", path))?
    };

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_json_config() {
        let json = r#"{
    "influx": {
        "base_url": "http://localhost:8086",
        "org": "home",
        "bucket": "solar",
        "token": "secret"
    },
    "gateway": {"base_url": "http://172.27.153.1"}
}"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.influx.org.as_deref(), Some("home"));
        assert_eq!(config.influx.token.as_deref(), Some("secret"));
        assert_eq!(config.gateway.base_url.as_deref(), Some("http://172.27.153.1"));
    }

    #[test]
    fn test_load_yaml_config() {
        let yaml = r#"
influx:
  base_url: http://localhost:8086
  bucket: solar
gateway:
  interface: eth1
log:
  level: debug
"#;
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.influx.bucket.as_deref(), Some("solar"));
        assert_eq!(config.gateway.interface.as_deref(), Some("eth1"));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_load_invalid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"influx": {"base_url": "ftp://x"}}"#).unwrap();
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config(Path::new("/nonexistent/solarstatconf.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_example_config_is_valid() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(include_bytes!("../../solarstatconf.example.json")).unwrap();
        assert!(load_config(file.path()).is_ok());
    }
}
