/// Environment toggle blocking every mutating tool invocation.
pub const READONLY_ENV_VAR: &str = "KINESIS-MCP-READONLY";

/// Environment region selector, overridden by a tool's `region_name`.
pub const REGION_ENV_VAR: &str = "AWS_REGION";

/// Environment log-verbosity selector (tracing env-filter syntax).
pub const LOG_ENV_VAR: &str = "KINESIS_MCP_LOG";

/// Region used when neither a tool parameter nor the environment names one.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Immutable process configuration, captured once at startup and passed to
/// every dispatch. The read-only flag is never re-read afterwards.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    pub read_only: bool,
    pub region: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            read_only: std::env::var(READONLY_ENV_VAR)
                .map(|v| parse_read_only(&v))
                .unwrap_or(false),
            region: std::env::var(REGION_ENV_VAR).ok().filter(|r| !r.is_empty()),
        }
    }

    pub fn read_only(read_only: bool) -> Self {
        Self {
            read_only,
            region: None,
        }
    }
}

/// Truthy values accepted for the read-only toggle.
pub fn parse_read_only(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthy_values() {
        assert!(parse_read_only("true"));
        assert!(parse_read_only("TRUE"));
        assert!(parse_read_only("1"));
        assert!(parse_read_only("yes"));
        assert!(parse_read_only("Yes"));
    }

    #[test]
    fn falsy_values() {
        assert!(!parse_read_only("false"));
        assert!(!parse_read_only("0"));
        assert!(!parse_read_only(""));
        assert!(!parse_read_only("no"));
        assert!(!parse_read_only("enabled"));
    }
}
