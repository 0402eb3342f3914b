//! Comparison operations with Lua 5.4 semantics.

use crate::coerce::float_to_integer;
use crate::string::StringInterner;
use crate::value::TValue;

/// Lua equality without metamethods.
/// Returns (equal, needs_metamethod). Only two distinct tables or two
/// distinct userdata can have their equality decided by `__eq`.
pub fn lua_eq(a: TValue, b: TValue) -> (bool, bool) {
    if a.raw_equals(&b) {
        return (true, false);
    }
    let needs_mm = matches!(
        (a, b),
        (TValue::Table(_), TValue::Table(_)) | (TValue::Userdata(_), TValue::Userdata(_))
    );
    (false, needs_mm)
}

/// Result of comparison that may need metamethod.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareResult {
    Ok(bool),
    NeedMetamethod,
}

/// Lua less-than comparison.
pub fn lua_lt(a: TValue, b: TValue, strings: &StringInterner) -> CompareResult {
    CompareResult::Ok(match (a, b) {
        (TValue::Int(x), TValue::Int(y)) => x < y,
        (TValue::Float(x), TValue::Float(y)) => x < y,
        (TValue::Int(i), TValue::Float(f)) => int_lt_float(i, f),
        (TValue::Float(f), TValue::Int(i)) => float_lt_int(f, i),
        (TValue::String(x), TValue::String(y)) => strings.get_bytes(x) < strings.get_bytes(y),
        _ => return CompareResult::NeedMetamethod,
    })
}

/// Lua less-than-or-equal comparison.
pub fn lua_le(a: TValue, b: TValue, strings: &StringInterner) -> CompareResult {
    CompareResult::Ok(match (a, b) {
        (TValue::Int(x), TValue::Int(y)) => x <= y,
        (TValue::Float(x), TValue::Float(y)) => x <= y,
        (TValue::Int(i), TValue::Float(f)) => int_le_float(i, f),
        (TValue::Float(f), TValue::Int(i)) => float_le_int(f, i),
        (TValue::String(x), TValue::String(y)) => strings.get_bytes(x) <= strings.get_bytes(y),
        _ => return CompareResult::NeedMetamethod,
    })
}

// Mixed comparisons are exact: `i < f` iff `i < ceil(f)`, and so on. When
// the rounded float is outside the integer range its sign decides.

fn int_lt_float(i: i64, f: f64) -> bool {
    match float_to_integer(f.ceil()) {
        Some(fi) => i < fi,
        None => f > 0.0,
    }
}

fn int_le_float(i: i64, f: f64) -> bool {
    match float_to_integer(f.floor()) {
        Some(fi) => i <= fi,
        None => f > 0.0,
    }
}

fn float_lt_int(f: f64, i: i64) -> bool {
    match float_to_integer(f.floor()) {
        Some(fi) => fi < i,
        None => f < 0.0,
    }
}

fn float_le_int(f: f64, i: i64) -> bool {
    match float_to_integer(f.ceil()) {
        Some(fi) => fi <= i,
        None => f < 0.0,
    }
}
