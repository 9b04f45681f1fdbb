use serde::{Deserialize, Serialize};
use std::{
  env, fs,
  path::PathBuf,
  time::{SystemTime, UNIX_EPOCH},
};

use crate::types::DEFAULT_BEST_OF;

pub fn repo_root() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

pub fn resolve_repo_path(raw: &str) -> PathBuf {
  let path = PathBuf::from(raw);
  if path.is_absolute() {
    path
  } else {
    repo_root().join(path)
  }
}

pub fn config_path() -> PathBuf {
  repo_root().join("config.json")
}

pub fn env_default(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|value| value.trim().to_string())
    .filter(|value| !value.is_empty())
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
  /// Directory the file-backed prediction store writes into.
  pub data_dir: String,
  /// Optional path to a seed bracket JSON; empty means the embedded fixture.
  pub seed_path: String,
  pub best_of: u32,
  /// Auto-pick RNG seed; 0 picks a clock-derived seed at startup.
  pub rng_seed: u64,
}

impl Default for AppConfig {
  fn default() -> Self {
    AppConfig {
      data_dir: "data".to_string(),
      seed_path: String::new(),
      best_of: DEFAULT_BEST_OF,
      rng_seed: 0,
    }
  }
}

pub fn apply_env_defaults(mut config: AppConfig) -> AppConfig {
  if let Some(value) = env_default("PICKS_DATA_DIR") {
    config.data_dir = value;
  }
  if config.seed_path.trim().is_empty() {
    if let Some(value) = env_default("PICKS_SEED_PATH") {
      config.seed_path = value;
    }
  }
  if config.rng_seed == 0 {
    if let Some(value) = env_default("PICKS_RNG_SEED") {
      if let Ok(parsed) = value.parse::<u64>() {
        config.rng_seed = parsed;
      }
    }
  }
  if config.best_of == 0 {
    config.best_of = DEFAULT_BEST_OF;
  }
  config
}

pub fn load_config() -> Result<AppConfig, String> {
  let path = config_path();
  if !path.is_file() {
    return Ok(apply_env_defaults(AppConfig::default()));
  }
  let data = fs::read_to_string(&path).map_err(|e| format!("read config {}: {e}", path.display()))?;
  let config =
    serde_json::from_str::<AppConfig>(&data).map_err(|e| format!("parse config {}: {e}", path.display()))?;
  Ok(apply_env_defaults(config))
}

pub fn save_config(config: AppConfig) -> Result<AppConfig, String> {
  let path = config_path();
  let payload = serde_json::to_string_pretty(&config).map_err(|e| e.to_string())?;
  fs::write(&path, payload).map_err(|e| format!("write config {}: {e}", path.display()))?;
  Ok(config)
}

pub fn load_env_file() {
  let env_path = repo_root().join(".env");
  if !env_path.is_file() {
    return;
  }
  let contents = match fs::read_to_string(&env_path) {
    Ok(data) => data,
    Err(_) => return,
  };
  for line in contents.lines() {
    if let Some((key, value)) = parse_env_line(line) {
      if env::var_os(&key).is_none() {
        env::set_var(key, value);
      }
    }
  }
}

pub fn parse_env_line(line: &str) -> Option<(String, String)> {
  let trimmed = line.trim();
  if trimmed.is_empty() || trimmed.starts_with('#') {
    return None;
  }
  let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
  let (key, raw_value) = trimmed.split_once('=')?;
  let key = key.trim();
  if key.is_empty() {
    return None;
  }
  let mut value = raw_value.trim();
  if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if value.starts_with('\'') && value.ends_with('\'') && value.len() >= 2 {
    value = &value[1..value.len() - 1];
  } else if let Some(idx) = value.find('#') {
    value = value[..idx].trim_end();
  }
  Some((key.to_string(), value.to_string()))
}

pub fn now_ms() -> u64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .unwrap_or_default()
    .as_millis() as u64
}
