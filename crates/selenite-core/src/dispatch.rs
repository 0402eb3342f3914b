//! Operator dispatch: the built-in behavior of each operation, with
//! metatable fallbacks when the operands do not support it natively.

use crate::arith::{self, ArithOp, ArithResult};
use crate::coerce;
use crate::compare::{self, CompareResult};
use crate::error::{LuaError, LuaResult};
use crate::metamethod::MetaMethod;
use crate::state::Lua;
use crate::value::TValue;

impl Lua {
    // ---- Indexing ----

    /// `t[key]` with `__index` support. A chain of table handlers is followed
    /// for at most `max_tag_loop` steps.
    pub fn index(&mut self, t: TValue, key: TValue) -> LuaResult<TValue> {
        let mut current = t;
        for _ in 0..self.config().max_tag_loop {
            let handler = match current {
                TValue::Table(idx) => {
                    let result = self.gc.get_table(idx).raw_get(key);
                    if !result.is_nil() {
                        return Ok(result);
                    }
                    match self.get_metamethod(current, MetaMethod::Index) {
                        Some(h) => h,
                        None => return Ok(TValue::nil()),
                    }
                }
                _ => self
                    .get_metamethod(current, MetaMethod::Index)
                    .ok_or_else(|| self.index_error(current, key))?,
            };
            if handler.is_function() {
                return self.call(handler, [current, key]);
            }
            current = handler;
        }
        Err(LuaError::LoopBound("gettable"))
    }

    /// `t[key] = value` with `__newindex` support. Existing keys are always
    /// assigned in place.
    pub fn set_index(&mut self, t: TValue, key: TValue, value: TValue) -> LuaResult<()> {
        let mut current = t;
        for _ in 0..self.config().max_tag_loop {
            let handler = match current {
                TValue::Table(idx) => {
                    let existing = self.gc.get_table(idx).raw_get(key);
                    let handler = if existing.is_nil() {
                        self.get_metamethod(current, MetaMethod::NewIndex)
                    } else {
                        None
                    };
                    match handler {
                        Some(h) => h,
                        None => return self.gc.get_table_mut(idx).raw_set(key, value),
                    }
                }
                _ => self
                    .get_metamethod(current, MetaMethod::NewIndex)
                    .ok_or_else(|| self.index_error(current, key))?,
            };
            if handler.is_function() {
                self.call(handler, [current, key, value])?;
                return Ok(());
            }
            current = handler;
        }
        Err(LuaError::LoopBound("settable"))
    }

    /// `t.name`
    pub fn get_field(&mut self, t: TValue, name: &str) -> LuaResult<TValue> {
        let key = self.create_string(name);
        self.index(t, key)
    }

    /// `t.name = value`
    pub fn set_field(&mut self, t: TValue, name: &str, value: TValue) -> LuaResult<()> {
        let key = self.create_string(name);
        self.set_index(t, key, value)
    }

    fn index_error(&self, t: TValue, key: TValue) -> LuaError {
        match self.string_lossy(key) {
            Some(name) => LuaError::Type(format!(
                "attempt to index a {} value (field '{name}')",
                t.type_name()
            )),
            None => LuaError::Type(format!("attempt to index a {} value", t.type_name())),
        }
    }

    // ---- Arithmetic ----

    /// A binary arithmetic or bitwise operation. Operands that are not
    /// numbers (or numeric strings) go to the left operand's handler, then
    /// the right one's.
    pub fn arith(&mut self, op: ArithOp, a: TValue, b: TValue) -> LuaResult<TValue> {
        match arith::arith_op(op, a, b, &self.strings) {
            ArithResult::Ok(v) => Ok(v),
            ArithResult::Error(e) => Err(e),
            ArithResult::NeedMetamethod => match self.binary_metamethod(a, b, op.metamethod()) {
                Some(handler) => self.call(handler, [a, b]),
                None => Err(self.arith_error(op.is_bitwise(), a, Some(b))),
            },
        }
    }

    pub fn add(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::Add, a, b)
    }

    pub fn sub(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::Sub, a, b)
    }

    pub fn mul(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::Mul, a, b)
    }

    pub fn div(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::Div, a, b)
    }

    /// Floored modulo: `a - floor(a/b)*b`.
    pub fn modulo(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::Mod, a, b)
    }

    pub fn pow(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::Pow, a, b)
    }

    pub fn idiv(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::IDiv, a, b)
    }

    pub fn band(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::BAnd, a, b)
    }

    pub fn bor(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::BOr, a, b)
    }

    pub fn bxor(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::BXor, a, b)
    }

    pub fn shl(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::Shl, a, b)
    }

    pub fn shr(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        self.arith(ArithOp::Shr, a, b)
    }

    /// Unary minus. The handler receives the operand twice.
    pub fn unm(&mut self, v: TValue) -> LuaResult<TValue> {
        match arith::arith_unm(v, &self.strings) {
            ArithResult::Ok(r) => Ok(r),
            ArithResult::Error(e) => Err(e),
            ArithResult::NeedMetamethod => match self.get_metamethod(v, MetaMethod::Unm) {
                Some(handler) => self.call(handler, [v, v]),
                None => Err(self.arith_error(false, v, None)),
            },
        }
    }

    /// Bitwise not. The handler receives the operand twice.
    pub fn bnot(&mut self, v: TValue) -> LuaResult<TValue> {
        match arith::arith_bnot(v, &self.strings) {
            ArithResult::Ok(r) => Ok(r),
            ArithResult::Error(e) => Err(e),
            ArithResult::NeedMetamethod => match self.get_metamethod(v, MetaMethod::BNot) {
                Some(handler) => self.call(handler, [v, v]),
                None => Err(self.arith_error(true, v, None)),
            },
        }
    }

    /// Error for an arithmetic or bitwise operation with no handler. Binary
    /// operations name both operand types; unary ones pass `None`.
    fn arith_error(&self, bitwise: bool, a: TValue, b: Option<TValue>) -> LuaError {
        let a_num = coerce::to_numeric(a, &self.strings).is_some();
        let what = if bitwise {
            "bitwise operation"
        } else {
            "arithmetic"
        };
        match b {
            Some(b) => {
                let b_num = coerce::to_numeric(b, &self.strings).is_some();
                if bitwise && a_num && b_num {
                    return LuaError::runtime("number has no integer representation");
                }
                LuaError::Type(format!(
                    "attempt to perform {what} on {} and {}",
                    a.type_name(),
                    b.type_name()
                ))
            }
            None if bitwise && a_num => {
                LuaError::runtime("number has no integer representation")
            }
            None => LuaError::Type(format!(
                "attempt to perform {what} on a {} value",
                a.type_name()
            )),
        }
    }

    // ---- Equality and ordering ----

    /// `a == b`. Values of the same kind compare built-in first; `__eq` only
    /// runs for two tables or two userdata whose metatables hold the very
    /// same handler.
    pub fn equals(&mut self, a: TValue, b: TValue) -> LuaResult<bool> {
        match compare::lua_eq(a, b) {
            (true, _) => Ok(true),
            (false, false) => Ok(false),
            (false, true) => {
                let (Some(mta), Some(mtb)) = (self.metatable_of(a), self.metatable_of(b)) else {
                    return Ok(false);
                };
                let name = self.names.get(MetaMethod::Eq);
                let ha = self.gc.get_table(mta).raw_get_str(name);
                let hb = self.gc.get_table(mtb).raw_get_str(name);
                if ha.is_nil() || !ha.raw_equals(&hb) {
                    return Ok(false);
                }
                Ok(self.call(ha, [a, b])?.is_truthy())
            }
        }
    }

    pub fn not_equals(&mut self, a: TValue, b: TValue) -> LuaResult<bool> {
        self.equals(a, b).map(|eq| !eq)
    }

    /// `a < b`
    pub fn less_than(&mut self, a: TValue, b: TValue) -> LuaResult<bool> {
        match compare::lua_lt(a, b, &self.strings) {
            CompareResult::Ok(r) => Ok(r),
            CompareResult::NeedMetamethod => match self.binary_metamethod(a, b, MetaMethod::Lt) {
                Some(handler) => Ok(self.call(handler, [a, b])?.is_truthy()),
                None => Err(compare_error(a, b)),
            },
        }
    }

    /// `a <= b`. Without `__le`, falls back to `not (b < a)` through the
    /// `__lt` found on `a`, then on `b`.
    pub fn less_equal(&mut self, a: TValue, b: TValue) -> LuaResult<bool> {
        match compare::lua_le(a, b, &self.strings) {
            CompareResult::Ok(r) => Ok(r),
            CompareResult::NeedMetamethod => {
                if let Some(handler) = self.binary_metamethod(a, b, MetaMethod::Le) {
                    return Ok(self.call(handler, [a, b])?.is_truthy());
                }
                match self.binary_metamethod(a, b, MetaMethod::Lt) {
                    Some(handler) => Ok(!self.call(handler, [b, a])?.is_truthy()),
                    None => Err(compare_error(a, b)),
                }
            }
        }
    }

    /// `a > b`, evaluated as `b < a`.
    pub fn greater_than(&mut self, a: TValue, b: TValue) -> LuaResult<bool> {
        self.less_than(b, a)
    }

    /// `a >= b`, evaluated as `b <= a`.
    pub fn greater_equal(&mut self, a: TValue, b: TValue) -> LuaResult<bool> {
        self.less_equal(b, a)
    }

    // ---- Concatenation and length ----

    /// `a .. b`
    pub fn concat(&mut self, a: TValue, b: TValue) -> LuaResult<TValue> {
        match arith::lua_concat(&[a, b], &mut self.strings) {
            ArithResult::Ok(v) => Ok(v),
            ArithResult::Error(e) => Err(e),
            ArithResult::NeedMetamethod => match self.binary_metamethod(a, b, MetaMethod::Concat) {
                Some(handler) => self.call(handler, [a, b]),
                None => Err(LuaError::Type(format!(
                    "attempt to concatenate {} and {}",
                    a.type_name(),
                    b.type_name()
                ))),
            },
        }
    }

    /// `#v`. Strings use their byte length; everything else consults
    /// `__len` first, and tables fall back to their border.
    pub fn len(&mut self, v: TValue) -> LuaResult<TValue> {
        if let Some(n) = arith::str_len(v, &self.strings) {
            return Ok(TValue::from_integer(n));
        }
        if let Some(handler) = self.get_metamethod(v, MetaMethod::Len) {
            return self.call(handler, [v]);
        }
        match v {
            TValue::Table(idx) => Ok(TValue::from_integer(self.gc.get_table(idx).length())),
            other => Err(LuaError::Type(format!(
                "attempt to get length of a {} value",
                other.type_name()
            ))),
        }
    }

    // ---- String conversion ----

    /// `tostring(v)`: `__tostring`, then `__name`, then the built-in form.
    pub fn tostring(&mut self, v: TValue) -> LuaResult<TValue> {
        if let Some(handler) = self.get_metamethod(v, MetaMethod::ToString) {
            let result = self.call(handler, [v])?;
            return match coerce::to_string_for_concat(result, &mut self.strings) {
                Some(id) => Ok(TValue::from_string_id(id)),
                None => Err(LuaError::runtime("'__tostring' must return a string")),
            };
        }
        if v.is_string() {
            return Ok(v);
        }
        let text = match self
            .get_metamethod(v, MetaMethod::Name)
            .and_then(|name| self.string_lossy(name).map(|s| s.into_owned()))
        {
            Some(name) => match object_address(v) {
                Some(addr) => format!("{name}: 0x{addr:08x}"),
                None => self.to_display_string(v),
            },
            None => self.to_display_string(v),
        };
        Ok(self.create_string(text))
    }

    /// The built-in text of a value, ignoring metatables.
    pub fn to_display_string(&self, v: TValue) -> String {
        match v {
            TValue::Nil => "nil".to_string(),
            TValue::Bool(b) => b.to_string(),
            TValue::Int(_) | TValue::Float(_) => coerce::number_to_string(v).unwrap_or_default(),
            TValue::String(id) => String::from_utf8_lossy(self.strings.get_bytes(id)).into_owned(),
            TValue::Function(idx) => format!("function: builtin: 0x{:08x}", idx.index()),
            other => match object_address(other) {
                Some(addr) => format!("{}: 0x{addr:08x}", other.type_name()),
                None => other.type_name().to_string(),
            },
        }
    }
}

fn object_address(v: TValue) -> Option<u32> {
    match v {
        TValue::Table(idx) => Some(idx.index()),
        TValue::Function(idx) => Some(idx.index()),
        TValue::Userdata(idx) => Some(idx.index()),
        TValue::Thread(idx) => Some(idx.index()),
        _ => None,
    }
}

fn compare_error(a: TValue, b: TValue) -> LuaError {
    let (ta, tb) = (a.type_name(), b.type_name());
    if ta == tb {
        LuaError::Type(format!("attempt to compare two {ta} values"))
    } else {
        LuaError::Type(format!("attempt to compare {ta} with {tb}"))
    }
}
