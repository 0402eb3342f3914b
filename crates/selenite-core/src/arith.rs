//! Arithmetic operations with Lua 5.4 semantics.
//!
//! These functions only handle the primitive cases. Anything that is not a
//! number (or a numeric string) comes back as `NeedMetamethod`, and the
//! runtime decides between a metamethod call and a type error.

use crate::coerce;
use crate::error::LuaError;
use crate::metamethod::MetaMethod;
use crate::string::StringInterner;
use crate::value::TValue;

/// Result of an arithmetic operation that may need a metamethod fallback.
#[derive(Debug)]
pub enum ArithResult {
    /// Operation succeeded with this value.
    Ok(TValue),
    /// Operands are not numbers: try a metamethod.
    NeedMetamethod,
    /// Actual error (e.g. integer division by zero): propagate.
    Error(LuaError),
}

/// Binary arithmetic and bitwise operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    IDiv,
    Mod,
    Pow,
    BAnd,
    BOr,
    BXor,
    Shl,
    Shr,
}

impl ArithOp {
    pub fn metamethod(self) -> MetaMethod {
        match self {
            ArithOp::Add => MetaMethod::Add,
            ArithOp::Sub => MetaMethod::Sub,
            ArithOp::Mul => MetaMethod::Mul,
            ArithOp::Div => MetaMethod::Div,
            ArithOp::IDiv => MetaMethod::IDiv,
            ArithOp::Mod => MetaMethod::Mod,
            ArithOp::Pow => MetaMethod::Pow,
            ArithOp::BAnd => MetaMethod::BAnd,
            ArithOp::BOr => MetaMethod::BOr,
            ArithOp::BXor => MetaMethod::BXor,
            ArithOp::Shl => MetaMethod::Shl,
            ArithOp::Shr => MetaMethod::Shr,
        }
    }

    pub fn is_bitwise(self) -> bool {
        matches!(
            self,
            ArithOp::BAnd | ArithOp::BOr | ArithOp::BXor | ArithOp::Shl | ArithOp::Shr
        )
    }
}

/// Perform a binary operation on numbers and numeric strings.
pub fn arith_op(op: ArithOp, a: TValue, b: TValue, strings: &StringInterner) -> ArithResult {
    if op.is_bitwise() {
        return bitwise_op(op, a, b, strings);
    }
    let (Some(na), Some(nb)) = (
        coerce::to_numeric(a, strings),
        coerce::to_numeric(b, strings),
    ) else {
        return ArithResult::NeedMetamethod;
    };
    if let (TValue::Int(ia), TValue::Int(ib)) = (na, nb) {
        if !matches!(op, ArithOp::Div | ArithOp::Pow) {
            return match int_arith(op, ia, ib) {
                Ok(i) => ArithResult::Ok(TValue::from_integer(i)),
                Err(e) => ArithResult::Error(e),
            };
        }
    }
    match (na.as_number(), nb.as_number()) {
        (Some(fa), Some(fb)) => ArithResult::Ok(TValue::from_float(float_arith(op, fa, fb))),
        _ => ArithResult::NeedMetamethod,
    }
}

/// Integer arithmetic. Overflow wraps around.
fn int_arith(op: ArithOp, a: i64, b: i64) -> Result<i64, LuaError> {
    Ok(match op {
        ArithOp::Add => a.wrapping_add(b),
        ArithOp::Sub => a.wrapping_sub(b),
        ArithOp::Mul => a.wrapping_mul(b),
        ArithOp::IDiv => {
            if b == 0 {
                return Err(LuaError::runtime("attempt to perform 'n//0'"));
            }
            lua_idiv(a, b)
        }
        ArithOp::Mod => {
            if b == 0 {
                return Err(LuaError::runtime("attempt to perform 'n%%0'"));
            }
            lua_imod(a, b)
        }
        ArithOp::BAnd => a & b,
        ArithOp::BOr => a | b,
        ArithOp::BXor => a ^ b,
        ArithOp::Shl => lua_shl(a, b),
        ArithOp::Shr => lua_shr(a, b),
        ArithOp::Div | ArithOp::Pow => unreachable!("float-only operator in integer path"),
    })
}

/// Float arithmetic. Division by zero follows IEEE 754.
fn float_arith(op: ArithOp, a: f64, b: f64) -> f64 {
    match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => a / b,
        ArithOp::Pow => a.powf(b),
        ArithOp::IDiv => (a / b).floor(),
        ArithOp::Mod => lua_fmod(a, b),
        ArithOp::BAnd | ArithOp::BOr | ArithOp::BXor | ArithOp::Shl | ArithOp::Shr => {
            unreachable!("bitwise operator in float path")
        }
    }
}

/// Floor division. `i64::MIN // -1` wraps to `i64::MIN`.
pub fn lua_idiv(a: i64, b: i64) -> i64 {
    let d = a.wrapping_div(b);
    let r = a.wrapping_rem(b);
    if r != 0 && (r ^ b) < 0 {
        d - 1
    } else {
        d
    }
}

/// Floored modulo: the result takes the sign of the divisor.
pub fn lua_imod(a: i64, b: i64) -> i64 {
    let r = a.wrapping_rem(b);
    if r != 0 && (r ^ b) < 0 {
        r.wrapping_add(b)
    } else {
        r
    }
}

/// Float modulo: `a - floor(a/b)*b`, computed from the truncated remainder
/// to avoid the rounding error of the direct formula.
pub fn lua_fmod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && ((r > 0.0) != (b > 0.0)) {
        r + b
    } else {
        r
    }
}

/// Logical left shift; negative counts shift right.
pub fn lua_shl(a: i64, b: i64) -> i64 {
    if b <= -64 || b >= 64 {
        0
    } else if b < 0 {
        ((a as u64) >> (-b) as u32) as i64
    } else {
        ((a as u64) << b as u32) as i64
    }
}

/// Logical right shift; negative counts shift left.
pub fn lua_shr(a: i64, b: i64) -> i64 {
    lua_shl(a, b.wrapping_neg())
}

/// Bitwise operators need integer representations of both operands.
/// Non-integral floats report `NeedMetamethod` so a handler gets a chance;
/// the runtime raises "number has no integer representation" if none exists.
fn bitwise_op(op: ArithOp, a: TValue, b: TValue, strings: &StringInterner) -> ArithResult {
    match (coerce::to_integer(a, strings), coerce::to_integer(b, strings)) {
        (Some(ia), Some(ib)) => match int_arith(op, ia, ib) {
            Ok(i) => ArithResult::Ok(TValue::from_integer(i)),
            Err(e) => ArithResult::Error(e),
        },
        _ => ArithResult::NeedMetamethod,
    }
}

/// Unary minus. Returns NeedMetamethod on type mismatch.
pub fn arith_unm(v: TValue, strings: &StringInterner) -> ArithResult {
    match coerce::to_numeric(v, strings) {
        Some(TValue::Int(i)) => ArithResult::Ok(TValue::from_integer(i.wrapping_neg())),
        Some(TValue::Float(f)) => ArithResult::Ok(TValue::from_float(-f)),
        _ => ArithResult::NeedMetamethod,
    }
}

/// Bitwise NOT. Returns NeedMetamethod when there is no integer value.
pub fn arith_bnot(v: TValue, strings: &StringInterner) -> ArithResult {
    match coerce::to_integer(v, strings) {
        Some(i) => ArithResult::Ok(TValue::from_integer(!i)),
        None => ArithResult::NeedMetamethod,
    }
}

/// String length in bytes (for `#` on strings).
pub fn str_len(v: TValue, strings: &StringInterner) -> Option<i64> {
    v.as_string_id()
        .map(|sid| strings.get_bytes(sid).len() as i64)
}

/// Concatenate values that are all strings or numbers into one string.
/// Returns NeedMetamethod if any value can't be converted.
pub fn lua_concat(values: &[TValue], strings: &mut StringInterner) -> ArithResult {
    let mut result = Vec::new();
    for &v in values {
        match coerce::to_string_for_concat(v, strings) {
            Some(sid) => result.extend_from_slice(strings.get_bytes(sid)),
            None => return ArithResult::NeedMetamethod,
        }
    }
    ArithResult::Ok(TValue::from_string_id(strings.intern(&result)))
}
