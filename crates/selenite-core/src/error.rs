//! Lua runtime error types.

use crate::string::StringInterner;
use crate::value::TValue;

/// Result alias used throughout the runtime.
pub type LuaResult<T> = Result<T, LuaError>;

/// A Lua runtime error.
#[derive(Clone, Debug, thiserror::Error)]
pub enum LuaError {
    /// General runtime failure with a message.
    #[error("{0}")]
    Runtime(String),
    /// An operation was applied to values of the wrong kind.
    #[error("{0}")]
    Type(String),
    /// A typed accessor rejected a value. `position` is the 1-based argument
    /// slot when the value came out of a `Varargs`.
    #[error("{}", argument_message(.position, .message))]
    Argument {
        position: Option<usize>,
        message: String,
    },
    /// An `__index`/`__newindex` chain exceeded the configured bound.
    #[error("loop in {0}")]
    LoopBound(&'static str),
    /// Too many nested calls.
    #[error("stack overflow")]
    StackOverflow,
    /// `error()` raised with an arbitrary value.
    #[error("(error object is a {} value)", value_type_name(.0))]
    Value(TValue),
}

fn argument_message(position: &Option<usize>, message: &str) -> String {
    match *position {
        Some(i) => format!("bad argument #{i}: {message}"),
        None => format!("bad argument: {message}"),
    }
}

fn value_type_name(value: &TValue) -> &'static str {
    value.type_name()
}

impl LuaError {
    pub fn runtime(msg: impl Into<String>) -> Self {
        LuaError::Runtime(msg.into())
    }

    /// "X expected, got Y" for a value of the wrong kind.
    pub fn type_mismatch(expected: &str, got: TValue) -> Self {
        LuaError::Type(format!("{expected} expected, got {}", got.type_name()))
    }

    /// An accessor failure not yet tied to an argument position.
    pub fn argument(message: impl Into<String>) -> Self {
        LuaError::Argument {
            position: None,
            message: message.into(),
        }
    }

    /// "bad argument: EXPECTED expected, got TYPE".
    pub fn bad_argument(expected: &str, got: TValue) -> Self {
        Self::argument(format!("{expected} expected, got {}", got.type_name()))
    }

    /// Attach an argument position. Errors that are not argument errors are
    /// returned unchanged.
    pub fn at_argument(self, position: usize) -> Self {
        match self {
            LuaError::Argument { message, .. } => LuaError::Argument {
                position: Some(position),
                message,
            },
            other => other,
        }
    }

    /// Convert this error into a TValue, as `pcall` would hand it to Lua.
    pub fn to_tvalue(&self, strings: &mut StringInterner) -> TValue {
        match self {
            LuaError::Value(v) => *v,
            other => TValue::from_string_id(strings.intern(other.to_string().as_bytes())),
        }
    }
}
