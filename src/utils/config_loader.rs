use dotenvy::dotenv;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;
use std::{env, fs};
use thiserror::Error;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([a-zA-Z_][0-9a-zA-Z_]*)\}").expect("env var pattern is a valid regex"));

#[allow(clippy::enum_variant_names)]
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Error loading config: {0}")]
    ConfigError(String),
}

/// Types that can be read from a TOML file with `${VAR}` expansion
pub trait ConfigLoader: Sized {
    fn validate(&self) -> Result<(), LoadConfigError> {
        Ok(())
    }

    fn load_from_file_sync(file_name: impl AsRef<Path>) -> Result<Self, LoadConfigError>
    where
        Self: DeserializeOwned,
    {
        let config: Self = load_from_file_sync(file_name)?;
        config.validate()?;
        Ok(config)
    }

    #[allow(async_fn_in_trait)]
    async fn load_from_file(file_name: impl AsRef<Path>) -> Result<Self, LoadConfigError>
    where
        Self: DeserializeOwned,
    {
        let config: Self = load_from_file(file_name).await?;
        config.validate()?;
        Ok(config)
    }
}

pub async fn load_from_file<T: DeserializeOwned>(file_name: impl AsRef<Path>) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = tokio::fs::read_to_string(file_name).await?;
    parse_config(&contents)
}

pub fn load_from_file_sync<T: DeserializeOwned>(file_name: impl AsRef<Path>) -> Result<T, LoadConfigError> {
    dotenv().ok();
    let contents = fs::read_to_string(file_name)?;
    parse_config(&contents)
}

/// Parse TOML after substituting `${VAR}` references from the environment
pub fn parse_config<T: DeserializeOwned>(raw_config: &str) -> Result<T, LoadConfigError> {
    let contents = expand_vars(raw_config);
    Ok(toml::from_str(&contents)?)
}

fn expand_vars(raw_config: &str) -> String {
    // Unknown variables are left as-is so the validation step can report them
    ENV_VAR_PATTERN
        .replace_all(raw_config, |caps: &Captures| match env::var(&caps[1]) {
            Ok(val) => val,
            Err(_) => caps[0].to_string(),
        })
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Section {
        name: String,
        count: u32,
    }

    #[test]
    fn test_unknown_vars_are_kept() {
        let raw = "url = \"${CHAIN_WINDOW_TEST_SURELY_UNSET_VAR}/rpc\"";
        assert_eq!(expand_vars(raw), raw);
    }

    #[test]
    fn test_known_var_is_expanded() {
        // PATH is set in every test environment
        let path = env::var("PATH").unwrap();
        assert_eq!(expand_vars("p = \"${PATH}\""), format!("p = \"{}\"", path));
    }

    #[test]
    fn test_parse_config() {
        let section: Section = parse_config("name = \"window\"\ncount = 3\n").unwrap();
        assert_eq!(section.name, "window");
        assert_eq!(section.count, 3);
    }

    #[test]
    fn test_load_from_file_sync() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("section.toml");
        fs::write(&path, "name = \"file\"\ncount = 9\n").unwrap();

        let section: Section = load_from_file_sync(&path).unwrap();
        assert_eq!(section.name, "file");
        assert_eq!(section.count, 9);

        let missing: Result<Section, _> = load_from_file_sync(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(LoadConfigError::IoError(_))));
    }
}
