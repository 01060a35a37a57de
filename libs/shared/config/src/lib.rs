use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Supabase,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "supabase" => Ok(StoreBackend::Supabase),
            other => Err(format!("unknown store backend '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store_backend: StoreBackend,
    pub supabase_url: String,
    pub supabase_service_key: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub average_consultation_minutes: u32,
    pub order_assignment_max_retries: u32,
    pub patient_code_max_attempts: u32,
    pub port: u16,
}

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_AVERAGE_CONSULTATION_MINUTES: u32 = 15;
pub const DEFAULT_ORDER_ASSIGNMENT_MAX_RETRIES: u32 = 10;
pub const DEFAULT_PATIENT_CODE_MAX_ATTEMPTS: u32 = 20;
pub const DEFAULT_PORT: u16 = 3000;

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            supabase_url: String::new(),
            supabase_service_key: String::new(),
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            average_consultation_minutes: DEFAULT_AVERAGE_CONSULTATION_MINUTES,
            order_assignment_max_retries: DEFAULT_ORDER_ASSIGNMENT_MAX_RETRIES,
            patient_code_max_attempts: DEFAULT_PATIENT_CODE_MAX_ATTEMPTS,
            port: DEFAULT_PORT,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            store_backend: parsed_var("STORE_BACKEND", StoreBackend::Memory),
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_service_key: env::var("SUPABASE_SERVICE_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_SERVICE_KEY not set, using empty value");
                    String::new()
                }),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .unwrap_or_else(|_| {
                    warn!("GEMINI_API_KEY not set, triage classification will be unavailable");
                    String::new()
                }),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string()),
            average_consultation_minutes: parsed_var(
                "AVERAGE_CONSULTATION_MINUTES",
                DEFAULT_AVERAGE_CONSULTATION_MINUTES,
            ),
            order_assignment_max_retries: parsed_var(
                "ORDER_ASSIGNMENT_MAX_RETRIES",
                DEFAULT_ORDER_ASSIGNMENT_MAX_RETRIES,
            ),
            patient_code_max_attempts: parsed_var(
                "PATIENT_CODE_MAX_ATTEMPTS",
                DEFAULT_PATIENT_CODE_MAX_ATTEMPTS,
            ),
            port: parsed_var("PORT", DEFAULT_PORT),
        };

        if config.store_backend == StoreBackend::Supabase && !config.is_supabase_configured() {
            warn!("STORE_BACKEND=supabase but Supabase credentials are missing");
        }

        config
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty() && !self.supabase_service_key.is_empty()
    }

    pub fn is_triage_configured(&self) -> bool {
        !self.gemini_api_key.is_empty() && !self.gemini_model.is_empty()
    }
}

fn parsed_var<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {:?}", name, raw, default);
            default
        }),
        Err(_) => default,
    }
}
