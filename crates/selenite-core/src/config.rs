//! Runtime limits and sizing hints.

use serde::{Deserialize, Serialize};

/// Configuration for a [`Lua`](crate::Lua) state.
///
/// Every field has a default, so a partial document deserializes fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nested calls allowed before `stack overflow` is raised.
    pub max_call_depth: usize,
    /// Links an `__index`/`__newindex` chain may follow before the lookup is
    /// reported as a loop.
    pub max_tag_loop: usize,
    /// Array capacity preallocated by `create_table`.
    pub table_array_hint: usize,
    /// Hash capacity preallocated by `create_table`.
    pub table_hash_hint: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_call_depth: 200,
            max_tag_loop: 100,
            table_array_hint: 0,
            table_hash_hint: 0,
        }
    }
}
