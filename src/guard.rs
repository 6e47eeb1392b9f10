//! Mutation guard: blocks mutating tool invocations under read-only mode.
//!
//! The check runs before parameter validation and payload encoding so a
//! refused call provably issues no remote traffic. The per-tool mutation
//! classification lives in the static tool registry; an operation missing
//! from the registry is never dispatched at all.

use crate::error::{ToolError, ToolResult};
use crate::tools::ToolDef;

/// Rejects the call when read-only mode is active and the tool mutates
/// remote state. Read-style tools always pass.
pub fn check(read_only: bool, tool: &ToolDef) -> ToolResult<()> {
    if read_only && tool.mutating {
        return Err(ToolError::ReadOnlyViolation {
            operation: tool.name.to_string(),
        });
    }
    Ok(())
}
