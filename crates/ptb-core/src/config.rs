use std::{
    env, fs,
    net::{Ipv4Addr, SocketAddr},
    path::Path,
    time::Duration,
};

use chrono_tz::Tz;

use crate::{errors::Error, Result};

pub const DEFAULT_API_BASE: &str = "https://public.api.openprocurement.org/api/2.5";
pub const DEFAULT_PORTAL_BASE: &str = "https://prozorro.gov.ua/tender";

/// Keyboard buttons offered on `/start`.
pub const DEFAULT_KEYWORDS: [&str; 7] = [
    "геотекстиль",
    "бентоніт",
    "георешітка",
    "геомембрана",
    "геосітка",
    "Протирадіаційного укриття нове будівництво",
    "Будівництво захисної споруди",
];

/// Typed configuration, built once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,
    pub webhook: Option<WebhookConfig>,
    pub keywords: Vec<String>,
    pub search: SearchSettings,
}

/// Where Telegram should push updates. Absent means long polling.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WebhookConfig {
    pub base_url: String,
    pub secret: String,
    pub listen_addr: SocketAddr,
}

impl WebhookConfig {
    /// Public URL registered with Telegram: `<base>/webhook/<secret>`.
    pub fn url(&self) -> String {
        format!("{}/webhook/{}", self.base_url.trim_end_matches('/'), self.secret)
    }
}

/// Everything the tender query pipeline needs: upstream location, fetch
/// bounds and rendering options.
#[derive(Clone, Debug)]
pub struct SearchSettings {
    pub api_base_url: String,
    pub portal_base_url: String,
    pub lookback: chrono::Duration,
    pub page_size: usize,
    pub max_pages: usize,
    pub request_timeout: Duration,
    pub display_limit: usize,
    pub chunk_limit: usize,
    pub display_tz: Tz,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            portal_base_url: DEFAULT_PORTAL_BASE.to_string(),
            lookback: chrono::Duration::hours(24),
            page_size: 100,
            max_pages: 50,
            request_timeout: Duration::from_secs(20),
            display_limit: 10,
            chunk_limit: 3800,
            display_tz: chrono_tz::Europe::Kyiv,
        }
    }
}

impl SearchSettings {
    pub fn lookback_hours(&self) -> i64 {
        self.lookback.num_hours()
    }
}

impl Config {
    /// Load from `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| get(key).and_then(non_empty);

        let telegram_bot_token = var("TELEGRAM_TOKEN")
            .or_else(|| var("TELEGRAM_BOT_TOKEN"))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_TOKEN environment variable is required".to_string())
            })?;

        // Render sets RENDER_EXTERNAL_URL itself; WEBHOOK_URL is for local runs.
        let webhook = match var("RENDER_EXTERNAL_URL").or_else(|| var("WEBHOOK_URL")) {
            Some(base_url) => {
                let port = parse_num::<u16>("PORT", var("PORT"))?.unwrap_or(8080);
                Some(WebhookConfig {
                    base_url: base_url.trim().trim_end_matches('/').to_string(),
                    secret: var("WEBHOOK_SECRET").unwrap_or_else(|| "secret".to_string()),
                    listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)),
                })
            }
            None => None,
        };

        let keywords = parse_csv(var("BOT_KEYWORDS"))
            .unwrap_or_else(|| DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect());

        let defaults = SearchSettings::default();
        let display_tz = match var("DISPLAY_TIMEZONE") {
            Some(name) => name
                .trim()
                .parse::<Tz>()
                .map_err(|e| Error::Config(format!("DISPLAY_TIMEZONE: {e}")))?,
            None => defaults.display_tz,
        };

        let search = SearchSettings {
            api_base_url: var("PROZORRO_API_BASE")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),
            portal_base_url: var("PROZORRO_PORTAL_BASE")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or(defaults.portal_base_url),
            lookback: defaults.lookback,
            page_size: positive("FEED_PAGE_SIZE", var("FEED_PAGE_SIZE"), defaults.page_size)?,
            max_pages: positive("FEED_MAX_PAGES", var("FEED_MAX_PAGES"), defaults.max_pages)?,
            request_timeout: Duration::from_secs(positive(
                "FEED_TIMEOUT_SECS",
                var("FEED_TIMEOUT_SECS"),
                defaults.request_timeout.as_secs(),
            )?),
            display_limit: positive("DISPLAY_LIMIT", var("DISPLAY_LIMIT"), defaults.display_limit)?,
            chunk_limit: positive(
                "MESSAGE_CHUNK_LIMIT",
                var("MESSAGE_CHUNK_LIMIT"),
                defaults.chunk_limit,
            )?,
            display_tz,
        };

        Ok(Self {
            telegram_bot_token,
            webhook,
            keywords,
            search,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, v: Option<String>) -> Result<Option<T>> {
    let Some(raw) = v else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be a number, got {raw:?}")))
}

fn positive<T>(key: &str, v: Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr + PartialOrd + Default,
{
    let value = parse_num::<T>(key, v)?.unwrap_or(default);
    if value <= T::default() {
        return Err(Error::Config(format!("{key} must be greater than zero")));
    }
    Ok(value)
}

fn parse_csv(v: Option<String>) -> Option<Vec<String>> {
    let out = v?
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn token_is_required() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup(&[("TELEGRAM_TOKEN", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn defaults_without_webhook() {
        let cfg = Config::from_lookup(lookup(&[("TELEGRAM_TOKEN", "t")])).unwrap();
        assert_eq!(cfg.telegram_bot_token, "t");
        assert!(cfg.webhook.is_none());
        assert_eq!(cfg.keywords.len(), DEFAULT_KEYWORDS.len());
        assert_eq!(cfg.search.page_size, 100);
        assert_eq!(cfg.search.max_pages, 50);
        assert_eq!(cfg.search.request_timeout, Duration::from_secs(20));
        assert_eq!(cfg.search.display_limit, 10);
        assert_eq!(cfg.search.chunk_limit, 3800);
        assert_eq!(cfg.search.lookback_hours(), 24);
        assert_eq!(cfg.search.display_tz, chrono_tz::Europe::Kyiv);
        assert_eq!(cfg.search.api_base_url, DEFAULT_API_BASE);
    }

    #[test]
    fn legacy_token_name_is_accepted() {
        let cfg = Config::from_lookup(lookup(&[("TELEGRAM_BOT_TOKEN", "legacy")])).unwrap();
        assert_eq!(cfg.telegram_bot_token, "legacy");
    }

    #[test]
    fn render_url_wins_over_webhook_url() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "t"),
            ("RENDER_EXTERNAL_URL", "https://bot.onrender.com/"),
            ("WEBHOOK_URL", "https://local.example"),
            ("WEBHOOK_SECRET", "s3cr3t"),
            ("PORT", "10000"),
        ]))
        .unwrap();
        let hook = cfg.webhook.unwrap();
        assert_eq!(hook.url(), "https://bot.onrender.com/webhook/s3cr3t");
        assert_eq!(hook.listen_addr.port(), 10000);
    }

    #[test]
    fn webhook_secret_defaults() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "t"),
            ("WEBHOOK_URL", "https://local.example"),
        ]))
        .unwrap();
        let hook = cfg.webhook.unwrap();
        assert_eq!(hook.url(), "https://local.example/webhook/secret");
        assert_eq!(hook.listen_addr.port(), 8080);
    }

    #[test]
    fn overrides_are_parsed() {
        let cfg = Config::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "t"),
            ("PROZORRO_API_BASE", "https://sandbox.example/api/2.5/"),
            ("BOT_KEYWORDS", "пісок, щебінь,,"),
            ("FEED_MAX_PAGES", "5"),
            ("DISPLAY_TIMEZONE", "UTC"),
        ]))
        .unwrap();
        assert_eq!(cfg.search.api_base_url, "https://sandbox.example/api/2.5");
        assert_eq!(cfg.keywords, vec!["пісок".to_string(), "щебінь".to_string()]);
        assert_eq!(cfg.search.max_pages, 5);
        assert_eq!(cfg.search.display_tz, chrono_tz::UTC);
    }

    #[test]
    fn rejects_zero_and_garbage_limits() {
        let err = Config::from_lookup(lookup(&[("TELEGRAM_TOKEN", "t"), ("FEED_PAGE_SIZE", "0")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err =
            Config::from_lookup(lookup(&[("TELEGRAM_TOKEN", "t"), ("DISPLAY_LIMIT", "ten")]))
                .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_lookup(lookup(&[
            ("TELEGRAM_TOKEN", "t"),
            ("DISPLAY_TIMEZONE", "Mars/Olympus"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
