use std::io::IsTerminal;

use crate::logger::format::LoggerFormat;

/// Crates whose events a bare level such as `debug` applies to.
pub const DASHBOARD_TARGETS: &[&str] = &["qdashd", "qdash_api", "qdash_core", "tower_http"];

/// Level for everything outside [`DASHBOARD_TARGETS`] when a bare level is given.
const DEPENDENCY_LEVEL: &str = "warn";

#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directive; see [`LoggerConfig::with_level`].
    pub level: String,
    pub with_targets: bool,
    pub use_color: bool,
}

impl LoggerConfig {
    pub fn with_format(mut self, format: LoggerFormat) -> Self {
        self.format = format;
        self
    }

    /// A bare level (`debug`) is scoped to the dashboard crates, with
    /// dependencies held at `warn`. Anything else (`info,hyper=debug`) is
    /// used as a full `EnvFilter` directive.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = scoped_directive(&level.into());
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            level: scoped_directive("info"),
            with_targets: true,
            use_color: std::io::stdout().is_terminal(),
        }
    }
}

fn scoped_directive(level: &str) -> String {
    let level = level.trim();
    if level.contains(['=', ',']) {
        return level.to_string();
    }

    let mut directive = String::from(DEPENDENCY_LEVEL);
    for target in DASHBOARD_TARGETS {
        directive.push(',');
        directive.push_str(target);
        directive.push('=');
        directive.push_str(level);
    }
    directive
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_level_is_scoped_to_dashboard_crates() {
        let cfg = LoggerConfig::default().with_level("debug");
        assert_eq!(
            cfg.level,
            "warn,qdashd=debug,qdash_api=debug,qdash_core=debug,tower_http=debug"
        );
    }

    #[test]
    fn full_directive_is_kept() {
        let cfg = LoggerConfig::default().with_level(" info,reqwest=trace ");
        assert_eq!(cfg.level, "info,reqwest=trace");
    }

    #[test]
    fn default_logs_dashboard_at_info() {
        let cfg = LoggerConfig::default();
        assert!(cfg.level.starts_with("warn,"));
        assert!(cfg.level.contains("qdash_core=info"));
    }
}
