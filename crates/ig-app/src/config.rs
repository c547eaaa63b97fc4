use std::env;
use std::str::FromStr;
use std::time::Duration;
use ig_core::PollSchedule;
use ig_core::schedule::{DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
use crate::error::AppError;

pub const API_URL: &str = "IMAGEGEN_API_URL";
pub const ACCESS_TOKEN: &str = "IMAGEGEN_ACCESS_TOKEN";
pub const POLL_ATTEMPTS: &str = "IMAGEGEN_POLL_ATTEMPTS";
pub const POLL_BASE_MS: &str = "IMAGEGEN_POLL_BASE_MS";
pub const HTTP_TIMEOUT_SECS: &str = "IMAGEGEN_HTTP_TIMEOUT_SECS";

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct GenConfig {
    pub api_url: String,
    pub access_token: Option<String>,
    pub schedule: PollSchedule,
    pub http_timeout: Duration,
}

impl GenConfig {
    /// Reads `.env` when present, then the process environment
    pub fn load() -> Result<Self, AppError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(AppError::InvalidSetting {
                    key: ".env",
                    reason: e.to_string(),
                });
            }
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup(API_URL)
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .ok_or(AppError::MissingSetting(API_URL))?;

        let access_token = lookup(ACCESS_TOKEN)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        let max_attempts: u8 = parse_or(&lookup, POLL_ATTEMPTS, DEFAULT_MAX_ATTEMPTS)?;
        if max_attempts == 0 {
            return Err(AppError::InvalidSetting {
                key: POLL_ATTEMPTS,
                reason: "must be at least 1".to_string(),
            });
        }

        let base_ms: u64 = parse_or(&lookup, POLL_BASE_MS, DEFAULT_BASE_DELAY.as_millis() as u64)?;
        let timeout_secs: u64 = parse_or(&lookup, HTTP_TIMEOUT_SECS, DEFAULT_HTTP_TIMEOUT.as_secs())?;

        Ok(Self {
            api_url,
            access_token,
            schedule: PollSchedule::new(max_attempts, Duration::from_millis(base_ms)),
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| AppError::InvalidSetting {
            key,
            reason: format!("'{}': {}", raw, e),
        }),
    }
}
