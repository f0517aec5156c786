use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub tests_file: String,
    pub results_file: String,
    pub test_snapshot_dir: String,
    pub test_duration_minutes: i64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            data_dir: PathBuf::from(get_env("DATA_DIR")?),
            tests_file: env::var("TESTS_FILE").unwrap_or_else(|_| "tests.json".to_string()),
            results_file: env::var("RESULTS_FILE").unwrap_or_else(|_| "results.json".to_string()),
            test_snapshot_dir: env::var("TEST_SNAPSHOT_DIR").unwrap_or_else(|_| "tests".to_string()),
            test_duration_minutes: get_env_parse_or("TEST_DURATION_MINUTES", 10)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
