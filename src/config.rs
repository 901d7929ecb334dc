#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    pub webhook_url: Option<String>,
    pub run_delay_ms: u64,
}

impl Config {
    /// Every key has a default, so a bare environment runs against
    /// `./jobs.db` on port 5000 with webhook delivery disabled.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "sqlite:jobs.db?mode=rwc".to_string());

        let listen_addr = env_or_fallback("JOBFLOW_LISTEN_ADDR", "LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:5000".to_string());

        let webhook_url = env_or_fallback("JOBFLOW_WEBHOOK_URL", "WEBHOOK_URL")
            .and_then(|s| normalize_optional_url(&s));

        let run_delay_ms = env_or_fallback("JOBFLOW_RUN_DELAY_MS", "RUN_DELAY_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        Self {
            database_url,
            listen_addr,
            webhook_url,
            run_delay_ms,
        }
    }
}

fn env_or_fallback(primary: &str, fallback: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| std::env::var(fallback).ok().filter(|s| !s.trim().is_empty()))
}

fn normalize_optional_url(value: &str) -> Option<String> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }
    if matches!(v.to_lowercase().as_str(), "0" | "off" | "false" | "none") {
        return None;
    }
    Some(v.to_string())
}
