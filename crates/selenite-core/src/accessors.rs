//! Typed value accessors for host functions.
//!
//! Three tiers per type:
//! - `to_*` never fails and yields a zero or empty value when the value does
//!   not convert.
//! - `check_*` raises an argument error naming the expected type.
//! - `opt_*` returns the given default for nil and otherwise behaves like
//!   `check_*`.
//!
//! Integer accessors truncate floats toward zero. Numbers are accepted where
//! strings are expected, and numeric strings where numbers are expected.
//!
//! The positional variants on [`Varargs`] read argument `i` and attach `i` to
//! any error.

use crate::coerce;
use crate::error::{LuaError, LuaResult};
use crate::gc::GcIdx;
use crate::state::Lua;
use crate::string::StringId;
use crate::table::Table;
use crate::value::TValue;
use crate::varargs::Varargs;
use std::any::Any;

fn truncate(f: f64) -> i64 {
    // Saturates at the i64 range; NaN becomes 0.
    f.trunc() as i64
}

impl Lua {
    // ---- to_* ----

    pub fn to_boolean(&self, v: TValue) -> bool {
        v.is_truthy()
    }

    pub fn to_integer(&self, v: TValue) -> i64 {
        match coerce::to_numeric(v, &self.strings) {
            Some(TValue::Int(i)) => i,
            Some(TValue::Float(f)) => truncate(f),
            _ => 0,
        }
    }

    pub fn to_number(&self, v: TValue) -> f64 {
        coerce::to_number(v, &self.strings).unwrap_or(0.0)
    }

    /// The string form of a string or number; nil for anything else.
    pub fn to_lua_string(&mut self, v: TValue) -> TValue {
        coerce::to_string_for_concat(v, &mut self.strings)
            .map_or(TValue::nil(), TValue::from_string_id)
    }

    pub fn to_table(&self, v: TValue) -> Option<GcIdx<Table>> {
        v.as_table_idx()
    }

    pub fn to_userdata<T: Any>(&self, v: TValue) -> Option<&T> {
        self.userdata_ref(v)
    }

    // ---- check_* ----

    pub fn check_boolean(&self, v: TValue) -> LuaResult<bool> {
        v.as_bool()
            .ok_or_else(|| LuaError::bad_argument("boolean", v))
    }

    pub fn check_integer(&self, v: TValue) -> LuaResult<i64> {
        match coerce::to_numeric(v, &self.strings) {
            Some(TValue::Int(i)) => Ok(i),
            Some(TValue::Float(f)) => Ok(truncate(f)),
            _ => Err(LuaError::bad_argument("number", v)),
        }
    }

    pub fn check_number(&self, v: TValue) -> LuaResult<f64> {
        coerce::to_number(v, &self.strings)
            .ok_or_else(|| LuaError::bad_argument("number", v))
    }

    /// A number as an integer or float, the way it was given.
    pub fn check_numeric(&self, v: TValue) -> LuaResult<TValue> {
        coerce::to_numeric(v, &self.strings)
            .ok_or_else(|| LuaError::bad_argument("number", v))
    }

    pub fn check_string(&mut self, v: TValue) -> LuaResult<StringId> {
        coerce::to_string_for_concat(v, &mut self.strings)
            .ok_or_else(|| LuaError::bad_argument("string", v))
    }

    pub fn check_table(&self, v: TValue) -> LuaResult<GcIdx<Table>> {
        v.as_table_idx()
            .ok_or_else(|| LuaError::bad_argument("table", v))
    }

    pub fn check_function(&self, v: TValue) -> LuaResult<TValue> {
        if v.is_function() {
            Ok(v)
        } else {
            Err(LuaError::bad_argument("function", v))
        }
    }

    pub fn check_thread(&self, v: TValue) -> LuaResult<TValue> {
        if v.is_thread() {
            Ok(v)
        } else {
            Err(LuaError::bad_argument("thread", v))
        }
    }

    /// A userdata holding a `T`.
    pub fn check_userdata<T: Any>(&self, v: TValue) -> LuaResult<&T> {
        if !v.is_userdata() {
            return Err(LuaError::bad_argument("userdata", v));
        }
        self.userdata_ref(v).ok_or_else(|| {
            LuaError::argument(format!(
                "{} expected, got userdata",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Any value but nil.
    pub fn check_not_nil(&self, v: TValue) -> LuaResult<TValue> {
        if v.is_nil() {
            Err(LuaError::argument("value expected"))
        } else {
            Ok(v)
        }
    }

    // ---- opt_* ----

    pub fn opt_boolean(&self, v: TValue, default: bool) -> LuaResult<bool> {
        if v.is_nil() {
            Ok(default)
        } else {
            self.check_boolean(v)
        }
    }

    pub fn opt_integer(&self, v: TValue, default: i64) -> LuaResult<i64> {
        if v.is_nil() {
            Ok(default)
        } else {
            self.check_integer(v)
        }
    }

    pub fn opt_number(&self, v: TValue, default: f64) -> LuaResult<f64> {
        if v.is_nil() {
            Ok(default)
        } else {
            self.check_number(v)
        }
    }

    pub fn opt_string(&mut self, v: TValue, default: &str) -> LuaResult<StringId> {
        if v.is_nil() {
            Ok(self.strings.intern_str(default))
        } else {
            self.check_string(v)
        }
    }

    pub fn opt_table(
        &self,
        v: TValue,
        default: Option<GcIdx<Table>>,
    ) -> LuaResult<Option<GcIdx<Table>>> {
        if v.is_nil() {
            Ok(default)
        } else {
            self.check_table(v).map(Some)
        }
    }

    pub fn opt_function(&self, v: TValue, default: TValue) -> LuaResult<TValue> {
        if v.is_nil() {
            Ok(default)
        } else {
            self.check_function(v)
        }
    }
}

impl Varargs {
    /// Argument `i`, which must be present (nil counts).
    pub fn check_value(&self, i: usize) -> LuaResult<TValue> {
        if self.is_value(i) {
            Ok(self.get(i))
        } else {
            Err(LuaError::argument("value expected").at_argument(i))
        }
    }

    pub fn check_not_nil(&self, lua: &Lua, i: usize) -> LuaResult<TValue> {
        lua.check_not_nil(self.get(i)).map_err(|e| e.at_argument(i))
    }

    pub fn check_boolean(&self, lua: &Lua, i: usize) -> LuaResult<bool> {
        lua.check_boolean(self.get(i)).map_err(|e| e.at_argument(i))
    }

    pub fn check_integer(&self, lua: &Lua, i: usize) -> LuaResult<i64> {
        lua.check_integer(self.get(i)).map_err(|e| e.at_argument(i))
    }

    pub fn check_number(&self, lua: &Lua, i: usize) -> LuaResult<f64> {
        lua.check_number(self.get(i)).map_err(|e| e.at_argument(i))
    }

    pub fn check_string(&self, lua: &mut Lua, i: usize) -> LuaResult<StringId> {
        lua.check_string(self.get(i)).map_err(|e| e.at_argument(i))
    }

    pub fn check_table(&self, lua: &Lua, i: usize) -> LuaResult<GcIdx<Table>> {
        lua.check_table(self.get(i)).map_err(|e| e.at_argument(i))
    }

    pub fn check_function(&self, lua: &Lua, i: usize) -> LuaResult<TValue> {
        lua.check_function(self.get(i)).map_err(|e| e.at_argument(i))
    }

    pub fn opt_boolean(&self, lua: &Lua, i: usize, default: bool) -> LuaResult<bool> {
        lua.opt_boolean(self.get(i), default)
            .map_err(|e| e.at_argument(i))
    }

    pub fn opt_integer(&self, lua: &Lua, i: usize, default: i64) -> LuaResult<i64> {
        lua.opt_integer(self.get(i), default)
            .map_err(|e| e.at_argument(i))
    }

    pub fn opt_number(&self, lua: &Lua, i: usize, default: f64) -> LuaResult<f64> {
        lua.opt_number(self.get(i), default)
            .map_err(|e| e.at_argument(i))
    }

    pub fn opt_string(&self, lua: &mut Lua, i: usize, default: &str) -> LuaResult<StringId> {
        lua.opt_string(self.get(i), default)
            .map_err(|e| e.at_argument(i))
    }
}
