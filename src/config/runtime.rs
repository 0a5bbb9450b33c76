use std::path::PathBuf;

/// Options file written by the Home Assistant supervisor
pub const DEFAULT_CONFIG_PATH: &str = "/data/options.json";

/// Process environment read once at startup.
#[derive(Debug, Clone)]
pub struct RuntimeEnv {
    pub config_path: PathBuf,
    /// Bearer token for the supervisor's Home Assistant API proxy
    pub supervisor_token: Option<String>,
}

impl Default for RuntimeEnv {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            supervisor_token: None,
        }
    }
}

impl RuntimeEnv {
    /// Build from env vars and the first CLI argument, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_sources(std::env::args().nth(1), |key| std::env::var(key).ok())
    }

    /// Resolve from an explicit argument and a variable lookup.
    ///
    /// Config path: argument, then `FRIGATE_NOTIFY_CONFIG`, then the default.
    /// Token: `SUPERVISOR_TOKEN`, then the legacy `TOKEN`.
    pub fn from_sources<F>(arg: Option<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = Self::default();

        if let Some(path) = arg.or_else(|| lookup("FRIGATE_NOTIFY_CONFIG")) {
            if !path.is_empty() {
                env.config_path = PathBuf::from(path);
            }
        }

        env.supervisor_token = lookup("SUPERVISOR_TOKEN")
            .filter(|t| !t.is_empty())
            .or_else(|| lookup("TOKEN").filter(|t| !t.is_empty()));

        env
    }
}
