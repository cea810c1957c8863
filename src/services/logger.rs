use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "error" => LogLevel::Error,
            "warn" => LogLevel::Warn,
            "debug" => LogLevel::Debug,
            _ => LogLevel::Info,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
    }

    fn rank(self) -> u8 {
        match self {
            LogLevel::Error => 0,
            LogLevel::Warn => 1,
            LogLevel::Info => 2,
            LogLevel::Debug => 3,
        }
    }

    fn allows(self, other: LogLevel) -> bool {
        other.rank() <= self.rank()
    }

    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// Installs the global subscriber. Output goes to stderr; stdout carries the
/// JSON-RPC stream.
pub fn init_tracing() {
    let filter = EnvFilter::try_new(LogLevel::from_env().directive())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Debug, Clone)]
pub struct Logger {
    context: String,
    level: LogLevel,
}

impl Logger {
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
            level: LogLevel::from_env(),
        }
    }

    pub fn child(&self, suffix: &str) -> Self {
        let context = if suffix.is_empty() {
            self.context.clone()
        } else {
            format!("{}:{}", self.context, suffix)
        };
        Self {
            context,
            level: self.level,
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    fn log(&self, level: LogLevel, message: &str, meta: Option<&Value>) {
        if !self.level.allows(level) {
            return;
        }
        let meta = meta
            .filter(|m| !m.is_null())
            .map(|m| m.to_string())
            .unwrap_or_default();
        let context = self.context.as_str();
        match level {
            LogLevel::Error => tracing::error!(context, meta = %meta, "{}", message),
            LogLevel::Warn => tracing::warn!(context, meta = %meta, "{}", message),
            LogLevel::Info => tracing::info!(context, meta = %meta, "{}", message),
            LogLevel::Debug => tracing::debug!(context, meta = %meta, "{}", message),
        }
    }

    pub fn error(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Error, message, meta);
    }

    pub fn warn(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Warn, message, meta);
    }

    pub fn info(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Info, message, meta);
    }

    pub fn debug(&self, message: &str, meta: Option<&Value>) {
        self.log(LogLevel::Debug, message, meta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_contexts_are_colon_joined() {
        let logger = Logger::new("pica").child("client").child("init");
        assert_eq!(logger.context(), "pica:client:init");
    }

    #[test]
    fn unknown_levels_fall_back_to_info() {
        assert_eq!(LogLevel::parse("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::parse(" WARN "), LogLevel::Warn);
        assert!(LogLevel::Warn.allows(LogLevel::Error));
        assert!(!LogLevel::Warn.allows(LogLevel::Info));
    }
}
