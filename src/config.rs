//! Centralized configuration for mixtape.
//!
//! - MixtapeConfig::from_env() reads MIXTAPE_* env vars; CLI flags override.
//! - Fluent `with_*` setters for tests and embedding.
//!
//! ENV:
//! - MIXTAPE_PRETTY=0|1 (default 1): indented output JSON.
//! - MIXTAPE_OVERWRITE=0|1 (default 0): allow replacing an existing output file.
//!
//! Порядок применения (`order_by_time`) из окружения НЕ читается: сортировка по
//! `time` обязательна, отключить её можно только явным флагом CLI `--file-order`.

use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MixtapeConfig {
    /// Pretty (2-space) vs compact output JSON.
    /// Env: MIXTAPE_PRETTY (default true)
    pub pretty_output: bool,

    /// When false, an existing output path is a fatal error.
    /// Env: MIXTAPE_OVERWRITE (default false)
    pub allow_overwrite: bool,

    /// Sort changes by `time` (stable). Off = file order, diagnostics only.
    /// CLI only (`--file-order`), never from env.
    pub order_by_time: bool,
}

impl Default for MixtapeConfig {
    fn default() -> Self {
        Self {
            pretty_output: true,
            allow_overwrite: false,
            order_by_time: true,
        }
    }
}

/// "1|true|yes|on" => true, "0|false|no|off" => false, остальное — None.
pub fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl MixtapeConfig {
    /// Load configuration from environment variables (unset/garbage keeps defaults).
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Как from_env, но с произвольным источником переменных (для тестов).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let flag = |name: &str| lookup(name).and_then(|v| parse_flag(&v));

        if let Some(on) = flag("MIXTAPE_PRETTY") {
            cfg.pretty_output = on;
        }
        if let Some(on) = flag("MIXTAPE_OVERWRITE") {
            cfg.allow_overwrite = on;
        }
        cfg
    }

    pub fn with_pretty_output(mut self, on: bool) -> Self {
        self.pretty_output = on;
        self
    }

    pub fn with_allow_overwrite(mut self, on: bool) -> Self {
        self.allow_overwrite = on;
        self
    }

    pub fn with_order_by_time(mut self, on: bool) -> Self {
        self.order_by_time = on;
        self
    }
}

impl fmt::Display for MixtapeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MixtapeConfig {{ pretty_output: {}, allow_overwrite: {}, order_by_time: {} }}",
            self.pretty_output, self.allow_overwrite, self.order_by_time
        )
    }
}
