use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use platform_store::{
    StoreSet,
    hosted::{HostedBackend, HostedConfig},
    memory::MemoryBackend,
};
use tracing::info;

const DEFAULT_STORE_TIMEOUT_MS: u64 = 10_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendConfig {
    Memory { latency: Duration, seed_demo: bool },
    Hosted(HostedConfig),
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub backend: BackendConfig,
    /// Upper bound on a single store write issued by a stage move.
    pub store_timeout: Duration,
    pub cors_allowed_origins: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let store_timeout = Duration::from_millis(
            parse_u64(var("STORE_TIMEOUT_MS"), "STORE_TIMEOUT_MS")?
                .unwrap_or(DEFAULT_STORE_TIMEOUT_MS),
        );

        let backend = match var("STORE_BACKEND")
            .unwrap_or_else(|| "memory".into())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "memory" => BackendConfig::Memory {
                latency: Duration::from_millis(
                    parse_u64(var("MOCK_LATENCY_MS"), "MOCK_LATENCY_MS")?.unwrap_or(0),
                ),
                seed_demo: var("SEED_DEMO")
                    .map(|val| matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
                    .unwrap_or(true),
            },
            "hosted" => {
                let base_url = var("HOSTED_API_URL")
                    .ok_or_else(|| anyhow!("HOSTED_API_URL is required when STORE_BACKEND=hosted"))?;
                let mut hosted = HostedConfig::new(base_url.trim());
                hosted.api_key = var("HOSTED_API_KEY");
                hosted.timeout = store_timeout;
                BackendConfig::Hosted(hosted)
            }
            other => return Err(anyhow!("unknown STORE_BACKEND {other:?}")),
        };

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .filter_map(|s| {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            })
            .collect::<Vec<_>>();

        Ok(Self {
            backend,
            store_timeout,
            cors_allowed_origins,
        })
    }

    /// Build the record stores the configured backend serves.
    pub fn store_set(&self) -> Result<StoreSet> {
        match &self.backend {
            BackendConfig::Memory { latency, seed_demo } => {
                let backend = if *seed_demo {
                    MemoryBackend::seeded()
                } else {
                    MemoryBackend::empty()
                };
                backend.set_latency(*latency);
                info!(
                    seed_demo = *seed_demo,
                    latency_ms = latency.as_millis() as u64,
                    "using in-memory store"
                );
                Ok(backend.store_set())
            }
            BackendConfig::Hosted(hosted) => {
                info!(base_url = %hosted.base_url, "using hosted record API");
                HostedBackend::store_set(hosted).context("failed to build hosted client")
            }
        }
    }
}

fn parse_u64(value: Option<String>, key: &str) -> Result<Option<u64>> {
    value
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .with_context(|| format!("{key} must be a whole number of milliseconds"))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_seeded_memory_store() {
        let config = config(&[]).unwrap();
        assert_eq!(
            config.backend,
            BackendConfig::Memory {
                latency: Duration::ZERO,
                seed_demo: true
            }
        );
        assert_eq!(config.store_timeout, Duration::from_secs(10));
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:5173"]);
    }

    #[test]
    fn hosted_backend_needs_a_url_and_inherits_the_timeout() {
        assert!(config(&[("STORE_BACKEND", "hosted")]).is_err());

        let config = config(&[
            ("STORE_BACKEND", "Hosted"),
            ("HOSTED_API_URL", "https://records.example.test/v1"),
            ("HOSTED_API_KEY", "secret"),
            ("STORE_TIMEOUT_MS", "2500"),
        ])
        .unwrap();
        let BackendConfig::Hosted(hosted) = config.backend else {
            panic!("expected hosted backend");
        };
        assert_eq!(hosted.api_key.as_deref(), Some("secret"));
        assert_eq!(hosted.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn rejects_garbage_numbers_and_backends() {
        assert!(config(&[("MOCK_LATENCY_MS", "soon")]).is_err());
        assert!(config(&[("STORE_BACKEND", "postgres")]).is_err());
    }
}
