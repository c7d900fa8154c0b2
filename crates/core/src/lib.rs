pub mod domain;
pub mod llm;
pub mod rank;
pub mod reconcile;
pub mod service;

pub mod config {
    use anyhow::Context;

    const DEFAULT_CORS_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub gms_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub cors_allowed_origins: Vec<String>,
        pub explainer_timeout_secs: u64,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let explainer_timeout_secs = match std::env::var("GMS_TIMEOUT_SECS") {
                Ok(s) => s
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("GMS_TIMEOUT_SECS must be an integer (got {s:?})"))?,
                Err(_) => crate::llm::gms::DEFAULT_TIMEOUT_SECS,
            };
            anyhow::ensure!(explainer_timeout_secs >= 1, "GMS_TIMEOUT_SECS must be >= 1");

            let cors_allowed_origins = std::env::var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|_| DEFAULT_CORS_ALLOWED_ORIGINS.to_string());

            Ok(Self {
                gms_key: std::env::var("GMS_KEY").ok().filter(|s| !s.trim().is_empty()),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                cors_allowed_origins: split_list(&cors_allowed_origins),
                explainer_timeout_secs,
            })
        }

        pub fn require_gms_key(&self) -> anyhow::Result<&str> {
            self.gms_key.as_deref().context("GMS_KEY is required")
        }

        pub fn explainer_timeout(&self) -> std::time::Duration {
            std::time::Duration::from_secs(self.explainer_timeout_secs)
        }
    }

    fn split_list(s: &str) -> Vec<String> {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    }

}
