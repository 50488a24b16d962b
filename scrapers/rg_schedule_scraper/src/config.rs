use serde::{Deserialize, Serialize};
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_API_URL: &str = "https://www.rolandgarros.com/api/en-us/polling";

/// How the upstream client treats the server's TLS certificate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TlsPolicy {
    #[default]
    Verify,
    /// Accept any certificate, including self-signed and expired ones.
    TrustAll,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpstreamConfig {
    pub url: String,
    pub user_agent: String,
    pub tls: TlsPolicy,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            user_agent: "Mozilla/5.0 (compatible; RGSchedule/1.0)".to_string(),
            tls: TlsPolicy::Verify,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub output_path: PathBuf,
    pub refresh_interval_secs: u64,
}

impl ScheduleConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("public/schedule.json"),
            refresh_interval_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub public_dir: PathBuf,
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            public_dir: PathBuf::from("public"),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "https://kayleecragg.github.io".to_string(),
                "https://tennis.ngrok.app".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    pub schedule: ScheduleConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = env::var("RG_API_URL") {
            config.upstream.url = url;
        }
        if let Ok(user_agent) = env::var("RG_USER_AGENT") {
            config.upstream.user_agent = user_agent;
        }
        if let Ok(trust_all) = env::var("RG_TLS_TRUST_ALL") {
            if matches!(trust_all.trim().to_lowercase().as_str(), "1" | "true" | "yes") {
                config.upstream.tls = TlsPolicy::TrustAll;
            }
        }
        if let Ok(output) = env::var("SCHEDULE_OUTPUT") {
            config.schedule.output_path = PathBuf::from(output);
        }
        if let Ok(Some(secs)) = env::var("SCHEDULE_REFRESH_SECS")
            .map_or(Ok(None), |s| s.parse::<u64>().map(Some))
        {
            // a zero period would make the interval timer panic
            if secs > 0 {
                config.schedule.refresh_interval_secs = secs;
            }
        }
        if let Ok(dir) = env::var("PUBLIC_DIR") {
            config.server.public_dir = PathBuf::from(dir);
        }
        if let Ok(Some(port)) = env::var("PORT")
            .map_or(Ok(None), |p| p.parse::<u16>().map(Some))
        {
            config.server.port = port;
        }
        if let Ok(origins) = env::var("CORS_ALLOWED_ORIGINS") {
            config.server.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }

        config
    }
}
