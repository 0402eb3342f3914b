//! Selenite core: Lua values, metatable dispatch, varargs, tables and
//! concatenation buffers.

pub mod accessors;
pub mod arith;
pub mod buffer;
pub mod call;
pub mod coerce;
pub mod compare;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gc;
pub mod metamethod;
pub mod object;
pub mod state;
pub mod string;
pub mod table;
pub mod value;
pub mod varargs;

pub use arith::ArithOp;
pub use buffer::ConcatBuffer;
pub use config::Config;
pub use error::{LuaError, LuaResult};
pub use gc::{GcIdx, GcStats};
pub use metamethod::MetaMethod;
pub use object::{LuaCallable, ThreadStatus};
pub use state::{Lua, TypeMetatables};
pub use string::StringId;
pub use table::{Table, WeakMode};
pub use value::{LuaType, TValue};
pub use varargs::{TailCall, Varargs};
