use std::{fs, path::Path};

use anyhow::{bail, Context};
use serde::Deserialize;
use shared::domain::Role;
use url::Url;

#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub token: Option<String>,
    pub role: String,
    pub customer_id: Option<String>,
    pub fetch_limit: u32,
    pub poll_seconds: u64,
    pub request_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8080/api".to_string(),
            token: None,
            role: "employee".to_string(),
            customer_id: None,
            fetch_limit: 50,
            poll_seconds: 30,
            request_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    token: Option<String>,
    role: Option<String>,
    customer_id: Option<String>,
    fetch_limit: Option<u32>,
    poll_seconds: Option<u64>,
    request_timeout_seconds: Option<u64>,
}

/// Layered settings: defaults, then an optional toml file (`counter.toml`
/// next to the binary unless a path is given), then `COUNTER__*` environment
/// variables. Malformed file or environment values are ignored in favor of
/// the previous layer.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let raw = match path {
        Some(path) => fs::read_to_string(path).ok(),
        None => fs::read_to_string("counter.toml").ok(),
    };
    if let Some(raw) = raw {
        if let Ok(file_settings) = toml::from_str::<FileSettings>(&raw) {
            if let Some(value) = file_settings.api_url {
                settings.api_url = value;
            }
            if let Some(value) = file_settings.token {
                settings.token = Some(value);
            }
            if let Some(value) = file_settings.role {
                settings.role = value;
            }
            if let Some(value) = file_settings.customer_id {
                settings.customer_id = Some(value);
            }
            if let Some(value) = file_settings.fetch_limit {
                settings.fetch_limit = value;
            }
            if let Some(value) = file_settings.poll_seconds {
                settings.poll_seconds = value;
            }
            if let Some(value) = file_settings.request_timeout_seconds {
                settings.request_timeout_seconds = value;
            }
        }
    }

    if let Ok(value) = std::env::var("COUNTER__API_URL") {
        settings.api_url = value;
    }
    if let Ok(value) = std::env::var("COUNTER__TOKEN") {
        settings.token = Some(value);
    }
    if let Ok(value) = std::env::var("COUNTER__ROLE") {
        settings.role = value;
    }
    if let Ok(value) = std::env::var("COUNTER__CUSTOMER_ID") {
        settings.customer_id = Some(value);
    }
    if let Ok(value) = std::env::var("COUNTER__FETCH_LIMIT") {
        if let Ok(parsed) = value.parse::<u32>() {
            settings.fetch_limit = parsed;
        }
    }
    if let Ok(value) = std::env::var("COUNTER__POLL_SECONDS") {
        if let Ok(parsed) = value.parse::<u64>() {
            settings.poll_seconds = parsed;
        }
    }
    if let Ok(value) = std::env::var("COUNTER__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = value.parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }

    settings
}

pub fn parse_role(raw: &str) -> anyhow::Result<Role> {
    let role = if raw.eq_ignore_ascii_case("manager") {
        Role::Manager
    } else if raw.eq_ignore_ascii_case("cashier") {
        Role::Cashier
    } else if raw.eq_ignore_ascii_case("cook") {
        Role::Cook
    } else if raw.eq_ignore_ascii_case("employee") {
        Role::Employee
    } else if raw.eq_ignore_ascii_case("customer") {
        Role::Customer
    } else {
        bail!("unknown role '{raw}'; expected manager, cashier, cook, employee or customer");
    };
    Ok(role)
}

/// Rejects zero settings values: a zero poll period would stall the watch
/// loop, a zero timeout fails every request and a zero limit empties every
/// fetch.
pub fn validate_limits(settings: &Settings) -> anyhow::Result<()> {
    if settings.fetch_limit == 0 {
        bail!("fetch_limit must be at least 1");
    }
    if settings.poll_seconds == 0 {
        bail!("poll_seconds must be at least 1");
    }
    if settings.request_timeout_seconds == 0 {
        bail!("request_timeout_seconds must be at least 1");
    }
    Ok(())
}

/// Validates the configured base URL and strips any trailing slash; request
/// paths are appended with a leading slash.
pub fn normalize_api_url(raw: &str) -> anyhow::Result<String> {
    let url = Url::parse(raw).with_context(|| format!("invalid api url '{raw}'"))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        bail!("api url must be http or https, got '{}'", url.scheme());
    }
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::{
        env,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn temp_settings_file(contents: &str) -> std::path::PathBuf {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("counter_settings_{suffix}.toml"));
        fs::write(&path, contents).expect("write settings file");
        path
    }

    #[test]
    fn role_parsing_accepts_all_counter_roles() {
        assert_eq!(parse_role("manager").expect("role"), Role::Manager);
        assert_eq!(parse_role("COOK").expect("role"), Role::Cook);
        assert_eq!(parse_role("Customer").expect("role"), Role::Customer);
        assert!(parse_role("barista").is_err());
    }

    #[test]
    fn api_url_normalization_strips_trailing_slash_and_checks_scheme() {
        assert_eq!(
            normalize_api_url("https://pos.example/api/").expect("url"),
            "https://pos.example/api"
        );
        assert_eq!(
            normalize_api_url("http://127.0.0.1:8080/api").expect("url"),
            "http://127.0.0.1:8080/api"
        );
        assert!(normalize_api_url("ftp://pos.example").is_err());
        assert!(normalize_api_url("not a url").is_err());
    }

    #[test]
    fn zero_limit_and_period_values_are_rejected() {
        assert!(validate_limits(&Settings::default()).is_ok());

        let zero_poll = Settings {
            poll_seconds: 0,
            ..Settings::default()
        };
        let err = validate_limits(&zero_poll).expect_err("zero poll period");
        assert!(err.to_string().contains("poll_seconds"));

        let zero_limit = Settings {
            fetch_limit: 0,
            ..Settings::default()
        };
        assert!(validate_limits(&zero_limit).is_err());

        let zero_timeout = Settings {
            request_timeout_seconds: 0,
            ..Settings::default()
        };
        assert!(validate_limits(&zero_timeout).is_err());
    }

    #[test]
    fn file_settings_override_defaults() {
        let path = temp_settings_file(
            "api_url = \"https://pos.example/api\"\nrole = \"cook\"\npoll_seconds = 5\n",
        );

        let settings = load_settings(Some(&path));
        assert_eq!(settings.api_url, "https://pos.example/api");
        assert_eq!(settings.role, "cook");
        assert_eq!(settings.poll_seconds, 5);
        assert_eq!(settings.fetch_limit, 50);
        assert!(settings.token.is_none());

        fs::remove_file(path).expect("cleanup");
    }

    #[test]
    fn env_values_override_the_file() {
        let path = temp_settings_file("request_timeout_seconds = 20\n");

        env::set_var("COUNTER__REQUEST_TIMEOUT_SECONDS", "25");
        let settings = load_settings(Some(&path));
        env::remove_var("COUNTER__REQUEST_TIMEOUT_SECONDS");

        assert_eq!(settings.request_timeout_seconds, 25);
        fs::remove_file(path).expect("cleanup");
    }
}
