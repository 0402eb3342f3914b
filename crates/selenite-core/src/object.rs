//! Heap object types other than tables and strings.

use crate::error::LuaResult;
use crate::gc::GcIdx;
use crate::state::Lua;
use crate::table::Table;
use crate::value::TValue;
use crate::varargs::Varargs;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Something Lua can call.
///
/// Returning a tail-call `Varargs` (see [`Varargs::tail_call`]) defers the
/// next call to the caller's trampoline instead of nesting it.
pub trait LuaCallable {
    fn on_invoke(&self, lua: &mut Lua, args: Varargs) -> LuaResult<Varargs>;

    /// Push every Lua value this callable holds on to, so the collector can
    /// keep it alive.
    fn trace(&self, _out: &mut Vec<TValue>) {}
}

/// A Rust closure exposed as a Lua function.
pub struct NativeFunction<F>(pub F);

impl<F> LuaCallable for NativeFunction<F>
where
    F: Fn(&mut Lua, Varargs) -> LuaResult<Varargs>,
{
    fn on_invoke(&self, lua: &mut Lua, args: Varargs) -> LuaResult<Varargs> {
        (self.0)(lua, args)
    }
}

/// A Rust closure with captured Lua values (its upvalues).
pub struct Closure<F> {
    captures: Vec<TValue>,
    func: F,
}

impl<F> Closure<F> {
    pub fn new(captures: Vec<TValue>, func: F) -> Self {
        Closure { captures, func }
    }
}

impl<F> LuaCallable for Closure<F>
where
    F: Fn(&mut Lua, &[TValue], Varargs) -> LuaResult<Varargs>,
{
    fn on_invoke(&self, lua: &mut Lua, args: Varargs) -> LuaResult<Varargs> {
        (self.func)(lua, &self.captures, args)
    }

    fn trace(&self, out: &mut Vec<TValue>) {
        out.extend_from_slice(&self.captures);
    }
}

/// A function object.
pub struct Function {
    pub name: String,
    pub body: Rc<dyn LuaCallable>,
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function({})", self.name)
    }
}

/// Opaque host data with an optional metatable and one associated Lua value.
pub struct Userdata {
    data: Box<dyn Any>,
    pub metatable: Option<GcIdx<Table>>,
    pub user_value: TValue,
}

impl Userdata {
    pub fn new(data: Box<dyn Any>) -> Self {
        Userdata {
            data,
            metatable: None,
            user_value: TValue::nil(),
        }
    }

    pub fn is<T: Any>(&self) -> bool {
        self.data.is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.data.downcast_mut()
    }
}

impl fmt::Debug for Userdata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Userdata")
            .field("metatable", &self.metatable)
            .field("user_value", &self.user_value)
            .finish_non_exhaustive()
    }
}

/// Coroutine status as reported by `coroutine.status`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThreadStatus {
    Suspended,
    Running,
    Normal,
    Dead,
}

impl ThreadStatus {
    pub const fn name(self) -> &'static str {
        match self {
            ThreadStatus::Suspended => "suspended",
            ThreadStatus::Running => "running",
            ThreadStatus::Normal => "normal",
            ThreadStatus::Dead => "dead",
        }
    }
}

/// A coroutine handle. Only identity and status live here; scheduling is
/// up to the embedder.
#[derive(Debug)]
pub struct Thread {
    pub body: TValue,
    pub status: ThreadStatus,
}
