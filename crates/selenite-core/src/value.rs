/// Tagged Lua value representation.
///
/// Every Lua value is a `TValue`: a small `Copy` enum whose heap-backed
/// variants (strings, tables, functions, userdata, threads) hold generational
/// arena handles into the runtime's [`GcHeap`](crate::gc::GcHeap) and
/// [`StringInterner`](crate::string::StringInterner).
///
/// Integer and float are separate variants so formatting and identity can
/// tell them apart, but both report [`LuaType::Number`] for dispatch.
use crate::gc::GcIdx;
use crate::object::{Function, Thread, Userdata};
use crate::string::StringId;
use crate::table::Table;
use std::fmt;

/// The Lua-visible type of a value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LuaType {
    Nil,
    Boolean,
    Number,
    String,
    Table,
    Function,
    Userdata,
    Thread,
}

impl LuaType {
    /// The name returned by Lua's `type()`.
    pub const fn name(self) -> &'static str {
        match self {
            LuaType::Nil => "nil",
            LuaType::Boolean => "boolean",
            LuaType::Number => "number",
            LuaType::String => "string",
            LuaType::Table => "table",
            LuaType::Function => "function",
            LuaType::Userdata => "userdata",
            LuaType::Thread => "thread",
        }
    }
}

impl fmt::Display for LuaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A Lua value.
#[derive(Clone, Copy, Default)]
pub enum TValue {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(StringId),
    Table(GcIdx<Table>),
    Function(GcIdx<Function>),
    Userdata(GcIdx<Userdata>),
    Thread(GcIdx<Thread>),
}

impl TValue {
    // ---- Constructors ----

    #[inline]
    pub fn nil() -> Self {
        TValue::Nil
    }

    #[inline]
    pub fn from_bool(b: bool) -> Self {
        TValue::Bool(b)
    }

    #[inline]
    pub fn from_integer(i: i64) -> Self {
        TValue::Int(i)
    }

    #[inline]
    pub fn from_float(f: f64) -> Self {
        TValue::Float(f)
    }

    #[inline]
    pub fn from_string_id(id: StringId) -> Self {
        TValue::String(id)
    }

    #[inline]
    pub fn from_table(idx: GcIdx<Table>) -> Self {
        TValue::Table(idx)
    }

    #[inline]
    pub fn from_function(idx: GcIdx<Function>) -> Self {
        TValue::Function(idx)
    }

    #[inline]
    pub fn from_userdata(idx: GcIdx<Userdata>) -> Self {
        TValue::Userdata(idx)
    }

    #[inline]
    pub fn from_thread(idx: GcIdx<Thread>) -> Self {
        TValue::Thread(idx)
    }

    // ---- Type checks ----

    /// The Lua type of this value.
    #[inline]
    pub fn type_of(&self) -> LuaType {
        match self {
            TValue::Nil => LuaType::Nil,
            TValue::Bool(_) => LuaType::Boolean,
            TValue::Int(_) | TValue::Float(_) => LuaType::Number,
            TValue::String(_) => LuaType::String,
            TValue::Table(_) => LuaType::Table,
            TValue::Function(_) => LuaType::Function,
            TValue::Userdata(_) => LuaType::Userdata,
            TValue::Thread(_) => LuaType::Thread,
        }
    }

    /// Name of this value's type, as `type()` reports it.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_of().name()
    }

    #[inline]
    pub fn is_type(&self, ty: LuaType) -> bool {
        self.type_of() == ty
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, TValue::Nil)
    }

    #[inline]
    pub fn is_bool(&self) -> bool {
        matches!(self, TValue::Bool(_))
    }

    #[inline]
    pub fn is_integer(&self) -> bool {
        matches!(self, TValue::Int(_))
    }

    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, TValue::Float(_))
    }

    /// True for integers and floats. Numeric strings are not numbers here;
    /// use the runtime's coercing accessors for that.
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, TValue::Int(_) | TValue::Float(_))
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, TValue::String(_))
    }

    #[inline]
    pub fn is_table(&self) -> bool {
        matches!(self, TValue::Table(_))
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self, TValue::Function(_))
    }

    #[inline]
    pub fn is_userdata(&self) -> bool {
        matches!(self, TValue::Userdata(_))
    }

    #[inline]
    pub fn is_thread(&self) -> bool {
        matches!(self, TValue::Thread(_))
    }

    /// True for values whose lifetime is decided by reachability: tables,
    /// functions, userdata and threads. Strings are heap-allocated but are
    /// values, so weak tables never drop them.
    #[inline]
    pub fn is_collectable(&self) -> bool {
        matches!(
            self,
            TValue::Table(_) | TValue::Function(_) | TValue::Userdata(_) | TValue::Thread(_)
        )
    }

    // ---- Extractors ----

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            TValue::Bool(b) => Some(b),
            _ => None,
        }
    }

    #[inline]
    pub fn as_integer(&self) -> Option<i64> {
        match *self {
            TValue::Int(i) => Some(i),
            _ => None,
        }
    }

    #[inline]
    pub fn as_float(&self) -> Option<f64> {
        match *self {
            TValue::Float(f) => Some(f),
            _ => None,
        }
    }

    /// Integers widen to float; everything else is `None`.
    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match *self {
            TValue::Int(i) => Some(i as f64),
            TValue::Float(f) => Some(f),
            _ => None,
        }
    }

    #[inline]
    pub fn as_string_id(&self) -> Option<StringId> {
        match *self {
            TValue::String(id) => Some(id),
            _ => None,
        }
    }

    #[inline]
    pub fn as_table_idx(&self) -> Option<GcIdx<Table>> {
        match *self {
            TValue::Table(idx) => Some(idx),
            _ => None,
        }
    }

    #[inline]
    pub fn as_function_idx(&self) -> Option<GcIdx<Function>> {
        match *self {
            TValue::Function(idx) => Some(idx),
            _ => None,
        }
    }

    #[inline]
    pub fn as_userdata_idx(&self) -> Option<GcIdx<Userdata>> {
        match *self {
            TValue::Userdata(idx) => Some(idx),
            _ => None,
        }
    }

    #[inline]
    pub fn as_thread_idx(&self) -> Option<GcIdx<Thread>> {
        match *self {
            TValue::Thread(idx) => Some(idx),
            _ => None,
        }
    }

    // ---- Lua semantics ----

    /// Lua falsy: only nil and false are falsy.
    #[inline]
    pub fn is_falsy(&self) -> bool {
        matches!(self, TValue::Nil | TValue::Bool(false))
    }

    /// Lua truthy: everything except nil and false, including `0` and `""`.
    #[inline]
    pub fn is_truthy(&self) -> bool {
        !self.is_falsy()
    }

    /// Primitive equality without metamethods (Lua's `rawequal`).
    ///
    /// Numbers compare by mathematical value across integer and float.
    /// Strings are interned, so id equality is content equality.
    pub fn raw_equals(&self, other: &TValue) -> bool {
        match (*self, *other) {
            (TValue::Nil, TValue::Nil) => true,
            (TValue::Bool(a), TValue::Bool(b)) => a == b,
            (TValue::Int(a), TValue::Int(b)) => a == b,
            (TValue::Float(a), TValue::Float(b)) => a == b,
            (TValue::Int(i), TValue::Float(f)) | (TValue::Float(f), TValue::Int(i)) => {
                crate::coerce::float_to_integer(f) == Some(i)
            }
            (TValue::String(a), TValue::String(b)) => a == b,
            (TValue::Table(a), TValue::Table(b)) => a == b,
            (TValue::Function(a), TValue::Function(b)) => a == b,
            (TValue::Userdata(a), TValue::Userdata(b)) => a == b,
            (TValue::Thread(a), TValue::Thread(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for TValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TValue::Nil => write!(f, "nil"),
            TValue::Bool(b) => write!(f, "{b}"),
            TValue::Int(i) => write!(f, "{i}"),
            TValue::Float(fl) => write!(f, "{}", crate::coerce::format_float(*fl)),
            TValue::String(id) => write!(f, "string({id:?})"),
            TValue::Table(idx) => write!(f, "table({idx:?})"),
            TValue::Function(idx) => write!(f, "function({idx:?})"),
            TValue::Userdata(idx) => write!(f, "userdata({idx:?})"),
            TValue::Thread(idx) => write!(f, "thread({idx:?})"),
        }
    }
}

impl PartialEq for TValue {
    fn eq(&self, other: &Self) -> bool {
        self.raw_equals(other)
    }
}

impl From<bool> for TValue {
    fn from(b: bool) -> Self {
        TValue::Bool(b)
    }
}

impl From<i64> for TValue {
    fn from(i: i64) -> Self {
        TValue::Int(i)
    }
}

impl From<i32> for TValue {
    fn from(i: i32) -> Self {
        TValue::Int(i as i64)
    }
}

impl From<f64> for TValue {
    fn from(f: f64) -> Self {
        TValue::Float(f)
    }
}

impl From<StringId> for TValue {
    fn from(id: StringId) -> Self {
        TValue::String(id)
    }
}

impl From<GcIdx<Table>> for TValue {
    fn from(idx: GcIdx<Table>) -> Self {
        TValue::Table(idx)
    }
}

impl From<GcIdx<Function>> for TValue {
    fn from(idx: GcIdx<Function>) -> Self {
        TValue::Function(idx)
    }
}

impl From<GcIdx<Userdata>> for TValue {
    fn from(idx: GcIdx<Userdata>) -> Self {
        TValue::Userdata(idx)
    }
}

impl From<GcIdx<Thread>> for TValue {
    fn from(idx: GcIdx<Thread>) -> Self {
        TValue::Thread(idx)
    }
}
