use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::{anyhow, Context};
use serde::Deserialize;

pub const DEFAULT_SETTINGS_FILE: &str = "wecare.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".into(),
            request_timeout_secs: 10,
        }
    }
}

impl ClientSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Defaults, then `wecare.toml` in the working directory, then environment.
pub fn load_settings() -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();
    let path = Path::new(DEFAULT_SETTINGS_FILE);
    if path.exists() {
        apply_file(&mut settings, path)?;
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    Ok(settings)
}

pub fn load_settings_from(path: &Path) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();
    apply_file(&mut settings, path)?;
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, path: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;

    if let Some(v) = file_cfg.get("api_base_url").and_then(toml::Value::as_str) {
        settings.api_base_url = v.to_string();
    }
    if let Some(v) = file_cfg
        .get("request_timeout_secs")
        .and_then(toml::Value::as_integer)
    {
        settings.request_timeout_secs = u64::try_from(v)
            .map_err(|_| anyhow!("request_timeout_secs must not be negative, got {v}"))?;
    }
    Ok(())
}

pub fn apply_env_overrides<F>(settings: &mut ClientSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("WECARE_API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("WECARE_REQUEST_TIMEOUT_SECS") {
        match v.parse::<u64>() {
            Ok(parsed) => settings.request_timeout_secs = parsed,
            Err(_) => tracing::warn!(value = %v, "ignoring unparsable WECARE_REQUEST_TIMEOUT_SECS"),
        }
    }
}

/// Validates the base URL and strips trailing slashes so paths can be
/// appended with `format!("{base}/...")`.
pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(ClientSettings::default().api_base_url);
    }
    let parsed = url::Url::parse(trimmed)
        .with_context(|| format!("invalid api base url '{trimmed}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(anyhow!(
            "api base url must use http or https, got '{}'",
            parsed.scheme()
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;

    #[test]
    fn strips_trailing_slash_and_keeps_path() {
        assert_eq!(
            normalize_base_url("http://10.0.2.2:8080/api/").expect("url"),
            "http://10.0.2.2:8080/api"
        );
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(normalize_base_url("ftp://example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
    }

    #[test]
    fn env_overrides_take_precedence_in_order() {
        let mut settings = ClientSettings::default();
        let env: HashMap<&str, &str> = [
            ("WECARE_API_BASE_URL", "http://first"),
            ("APP__API_BASE_URL", "http://second"),
            ("WECARE_REQUEST_TIMEOUT_SECS", "3"),
        ]
        .into_iter()
        .collect();
        apply_env_overrides(&mut settings, |key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.api_base_url, "http://second");
        assert_eq!(settings.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn bad_timeout_env_value_keeps_default() {
        let mut settings = ClientSettings::default();
        apply_env_overrides(&mut settings, |key| {
            (key == "WECARE_REQUEST_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert_eq!(settings.request_timeout_secs, 10);
    }

    #[test]
    fn reads_settings_file() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("wecare_settings_test_{suffix}.toml"));
        fs::write(
            &path,
            "api_base_url = \"https://wecare.example/api/\"\nrequest_timeout_secs = 25\n",
        )
        .expect("write settings");

        let mut settings = ClientSettings::default();
        apply_file(&mut settings, &path).expect("apply file");
        assert_eq!(settings.api_base_url, "https://wecare.example/api/");
        assert_eq!(settings.request_timeout_secs, 25);

        fs::remove_file(path).expect("cleanup");
    }
}
