use std::time::Duration;

/// Where the server lives and how hard to page through it.
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct Config {
    pub api_base: String,
    pub uploads_base: String,
    pub per_page: u32,
    pub max_pages: u32,
    pub request_timeout_secs: u64,
}

pub const DEFAULT_PER_PAGE: u32 = 500;
pub const DEFAULT_MAX_PAGES: u32 = 100;

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "http://localhost/api".to_owned(),
            uploads_base: "http://localhost/uploads".to_owned(),
            per_page: DEFAULT_PER_PAGE,
            max_pages: DEFAULT_MAX_PAGES,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Defaults overridden by `GAME_SHELF_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(base) = lookup("GAME_SHELF_API") {
            cfg.api_base = base.trim_end_matches('/').to_owned();
        }
        if let Some(base) = lookup("GAME_SHELF_UPLOADS") {
            cfg.uploads_base = base.trim_end_matches('/').to_owned();
        }
        cfg.per_page = parse_or(&lookup, "GAME_SHELF_PER_PAGE", cfg.per_page).max(1);
        cfg.max_pages = parse_or(&lookup, "GAME_SHELF_MAX_PAGES", cfg.max_pages).max(1);
        cfg.request_timeout_secs = parse_or(&lookup, "GAME_SHELF_TIMEOUT", cfg.request_timeout_secs);
        cfg
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL of an endpoint such as `games.php`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_or<T: std::str::FromStr + Copy>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            log::warn!("Ignoring malformed {key}={raw:?}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_overrides_defaults() {
        let cfg = Config::from_lookup(|key| match key {
            "GAME_SHELF_API" => Some("https://shelf.example/api/".to_owned()),
            "GAME_SHELF_PER_PAGE" => Some("250".to_owned()),
            "GAME_SHELF_MAX_PAGES" => Some("lots".to_owned()),
            _ => None,
        });
        assert_eq!(cfg.api_base, "https://shelf.example/api");
        assert_eq!(cfg.per_page, 250);
        assert_eq!(cfg.max_pages, DEFAULT_MAX_PAGES);
        assert_eq!(cfg.endpoint("/games.php"), "https://shelf.example/api/games.php");
    }
}
