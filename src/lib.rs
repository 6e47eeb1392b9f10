pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod guard;
pub mod mcp_server;
pub mod tools;
pub mod validate;

pub use client::{KinesisApi, KinesisSdkClient};
pub use config::ServerConfig;
pub use error::{McpError, ToolError};
pub use mcp_server::KinesisMcpServer;

/// Maximum size for tool response output
pub const MAX_TOOL_RESPONSE_SIZE: usize = 100_000;

/// Truncates to at most `max` bytes without splitting a UTF-8 character.
pub fn truncate_utf8(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
