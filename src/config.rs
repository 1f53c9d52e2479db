use serde::Deserialize;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    pub webdriver_url: String,
    pub headless: bool,
    pub login_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub newton_base_url: String,
    pub frontend_url: String,
    pub session_ttl_days: i64,
    /// Offset used to compute "today" and to render slot times.
    pub schedule_utc_offset_minutes: i32,
    pub llm: LlmConfig,
    pub browser: BrowserConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let llm = LlmConfig {
            api_key: std::env::var("ANTHROPIC_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            model: std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
        };
        let browser = BrowserConfig {
            webdriver_url: std::env::var("WEBDRIVER_URL")
                .unwrap_or_else(|_| "http://localhost:4444".into()),
            headless: std::env::var("BROWSER_HEADLESS")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            login_timeout_ms: parse_env("LOGIN_TIMEOUT_MS", 60_000),
        };
        Ok(Self {
            database_url,
            newton_base_url: std::env::var("NEWTON_BASE_URL")
                .unwrap_or_else(|_| "https://my.newtonschool.co".into()),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            session_ttl_days: parse_env("SESSION_TTL_DAYS", 7),
            schedule_utc_offset_minutes: parse_env("SCHEDULE_UTC_OFFSET_MINUTES", 0),
            llm,
            browser,
        })
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
