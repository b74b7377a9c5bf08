// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Environment keys that carry a comma separated list.
const LIST_KEYS: &[&str] = &["backend_urls"];

/// Load configuration from an optional file (YAML or JSON) overlaid with
/// environment variables, then validate it.
pub fn load_config<P: AsRef<Path>>(path: Option<P>) -> Result<Config> {
    load_config_with_env(path, None)
}

/// Same as [`load_config`], but reads variables from `vars` instead of the
/// process environment when given.
pub fn load_config_with_env<P: AsRef<Path>>(
    path: Option<P>,
    vars: Option<HashMap<String, String>>,
) -> Result<Config> {
    let mut builder = ::config::Config::builder();

    if let Some(path) = path {
        let path = path.as_ref();
        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => ::config::FileFormat::Yaml,
            Some("json") => ::config::FileFormat::Json,
            other => anyhow::bail!("Unsupported config file extension: {:?}", other),
        };
        builder = builder.add_source(
            ::config::File::from(path)
                .format(format)
                .required(true),
        );
    }

    let config = builder
        .add_source(environment().source(vars))
        .build()
        .context("Failed to read configuration")?
        .try_deserialize::<Config>()
        .context("Failed to parse configuration")?;

    config.validate()?;
    Ok(config)
}

fn environment() -> ::config::Environment {
    LIST_KEYS.iter().fold(
        ::config::Environment::default()
            .try_parsing(true)
            .list_separator(","),
        |env, key| env.with_list_parse_key(key),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}", std::process::id(), name));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_yaml_file() {
        let path = write_temp(
            "lb.yaml",
            "address: 127.0.0.1:9000\n\
             backend_urls:\n  - http://10.0.0.1:8080\n  - http://10.0.0.2:8080\n\
             health_check_path: /health\n\
             log_format: json\n",
        );
        let config = load_config_with_env(Some(&path), Some(HashMap::new())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.address, "127.0.0.1:9000");
        assert_eq!(config.backends().unwrap().len(), 2);
        assert_eq!(config.health_check_path, "/health");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.health_check_interval_seconds, 5);
    }

    #[test]
    fn test_load_json_file() {
        let path = write_temp(
            "lb.json",
            r#"{"backend_urls": ["https://api.internal"], "health_check_interval_seconds": 10}"#,
        );
        let config = load_config_with_env(Some(&path), Some(HashMap::new())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.health_check_interval_seconds, 10);
        assert_eq!(config.backends().unwrap()[0].scheme(), "https");
    }

    #[test]
    fn test_invalid_backend_in_file_fails_validation() {
        let path = write_temp("bad.yaml", "backend_urls:\n  - ftp://nope\n");
        let result = load_config_with_env(Some(&path), Some(HashMap::new()));
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }

    fn vars(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_environment_overrides_file() {
        let path = write_temp(
            "override.yaml",
            "backend_urls:\n  - http://10.0.0.1:8080\nhealth_check_interval_seconds: 10\n",
        );
        let config = load_config_with_env(
            Some(&path),
            vars(&[
                ("HEALTH_CHECK_INTERVAL_SECONDS", "3"),
                ("BACKEND_URLS", "http://a:1,http://b:2"),
            ]),
        )
        .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.health_check_interval_seconds, 3);
        let ids: Vec<_> = config
            .backends()
            .unwrap()
            .iter()
            .map(|u| u.host_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_environment_only() {
        let config = load_config_with_env(
            None::<&str>,
            vars(&[
                ("ADDRESS", "127.0.0.1:7000"),
                ("BACKEND_URLS", "http://a:1"),
                ("HEALTH_CHECK_PATH", "/ping"),
            ]),
        )
        .unwrap();

        assert_eq!(config.address, "127.0.0.1:7000");
        assert_eq!(config.health_check_path, "/ping");
        assert_eq!(config.health_check_interval_seconds, 5);
    }

    #[test]
    fn test_missing_backends_in_environment_fails() {
        assert!(load_config_with_env(None::<&str>, Some(HashMap::new())).is_err());
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(load_config(Some("lb.toml.bak")).is_err());
    }
}
