//! Type coercion helpers for Lua 5.4 semantics.

use crate::string::{StringId, StringInterner};
use crate::value::TValue;

/// Lua's notion of whitespace around numerals.
fn is_lua_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| !is_lua_space(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|&b| !is_lua_space(b)).map_or(start, |p| p + 1);
    &bytes[start..end]
}

/// Parse a Lua numeral: decimal or hexadecimal, integer or float, with
/// optional sign and surrounding whitespace.
///
/// Decimal integers that overflow become floats; hexadecimal integers wrap
/// around modulo 2^64.
pub fn str_to_number(bytes: &[u8]) -> Option<TValue> {
    let s = trim(bytes);
    let (neg, body) = match s.first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    if body.len() >= 2 && body[0] == b'0' && (body[1] | 0x20) == b'x' {
        parse_hex(&body[2..], neg)
    } else {
        parse_decimal(body, neg)
    }
}

fn parse_decimal(body: &[u8], neg: bool) -> Option<TValue> {
    if body.is_empty() {
        return None;
    }
    if body.iter().all(u8::is_ascii_digit) {
        if let Some(i) = decimal_integer(body, neg) {
            return Some(TValue::from_integer(i));
        }
    }
    let mut i = 0;
    let mut digits = 0;
    while i < body.len() && body[i].is_ascii_digit() {
        i += 1;
        digits += 1;
    }
    if i < body.len() && body[i] == b'.' {
        i += 1;
        while i < body.len() && body[i].is_ascii_digit() {
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    if i < body.len() && (body[i] | 0x20) == b'e' {
        i += 1;
        if i < body.len() && (body[i] == b'+' || body[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < body.len() && body[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return None;
        }
    }
    if i != body.len() {
        return None;
    }
    let text = std::str::from_utf8(body).ok()?;
    let f: f64 = text.parse().ok()?;
    Some(TValue::from_float(if neg { -f } else { f }))
}

/// Accumulate decimal digits, giving up on overflow. `-9223372036854775808`
/// is still an integer.
fn decimal_integer(digits: &[u8], neg: bool) -> Option<i64> {
    let mut acc: u64 = 0;
    for &d in digits {
        acc = acc.checked_mul(10)?.checked_add((d - b'0') as u64)?;
    }
    let limit = if neg { i64::MIN.unsigned_abs() } else { i64::MAX as u64 };
    if acc > limit {
        return None;
    }
    Some(if neg { (acc as i64).wrapping_neg() } else { acc as i64 })
}

fn parse_hex(body: &[u8], neg: bool) -> Option<TValue> {
    if !body.is_empty() && body.iter().all(u8::is_ascii_hexdigit) {
        let mut acc: u64 = 0;
        for &d in body {
            acc = acc.wrapping_mul(16).wrapping_add(hex_digit(d) as u64);
        }
        let i = acc as i64;
        return Some(TValue::from_integer(if neg { i.wrapping_neg() } else { i }));
    }

    let mut mantissa = 0.0f64;
    let mut exp: i64 = 0;
    let mut digits = 0;
    let mut i = 0;
    while i < body.len() && body[i].is_ascii_hexdigit() {
        mantissa = mantissa * 16.0 + hex_digit(body[i]) as f64;
        i += 1;
        digits += 1;
    }
    if i < body.len() && body[i] == b'.' {
        i += 1;
        while i < body.len() && body[i].is_ascii_hexdigit() {
            mantissa = mantissa * 16.0 + hex_digit(body[i]) as f64;
            exp -= 4;
            i += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return None;
    }
    if i < body.len() && (body[i] | 0x20) == b'p' {
        i += 1;
        let exp_neg = match body.get(i) {
            Some(b'-') => {
                i += 1;
                true
            }
            Some(b'+') => {
                i += 1;
                false
            }
            _ => false,
        };
        let start = i;
        let mut e: i64 = 0;
        while i < body.len() && body[i].is_ascii_digit() {
            e = e.saturating_mul(10).saturating_add((body[i] - b'0') as i64);
            i += 1;
        }
        if i == start {
            return None;
        }
        exp = exp.saturating_add(if exp_neg { -e } else { e });
    }
    if i != body.len() {
        return None;
    }
    let f = mantissa * 2f64.powi(exp.clamp(i32::MIN as i64, i32::MAX as i64) as i32);
    Some(TValue::from_float(if neg { -f } else { f }))
}

fn hex_digit(b: u8) -> u32 {
    (b as char).to_digit(16).unwrap_or(0)
}

/// Number or numeric string, as a normalized number value.
pub fn to_numeric(v: TValue, strings: &StringInterner) -> Option<TValue> {
    match v {
        TValue::Int(_) | TValue::Float(_) => Some(v),
        TValue::String(id) => str_to_number(strings.get_bytes(id)),
        _ => None,
    }
}

/// Try to convert a TValue to f64 (number coercion).
/// Integers convert to float; strings that look like numbers also convert.
pub fn to_number(v: TValue, strings: &StringInterner) -> Option<f64> {
    to_numeric(v, strings).and_then(|n| n.as_number())
}

/// Try to convert a TValue to i64 without losing information: floats must
/// be integral, numeric strings follow the same rule.
pub fn to_integer(v: TValue, strings: &StringInterner) -> Option<i64> {
    match to_numeric(v, strings)? {
        TValue::Int(i) => Some(i),
        TValue::Float(f) => float_to_integer(f),
        _ => None,
    }
}

/// Convert a float to integer if it is integral and in range.
pub fn float_to_integer(f: f64) -> Option<i64> {
    // -2^63 is exact as a float; 2^63 is the first value out of range.
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    if f.fract() == 0.0 && (LOWER..UPPER).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

/// Format a float the way Lua 5.4 prints it: `%.14g`, plus `.0` when the
/// result would otherwise read as an integer.
pub fn format_float(f: f64) -> String {
    let mut s = format_g14(f);
    if s.bytes().all(|b| b == b'-' || b.is_ascii_digit()) {
        s.push_str(".0");
    }
    s
}

/// C's `%.14g`.
fn format_g14(f: f64) -> String {
    const PRECISION: i32 = 14;
    if f.is_nan() {
        return if f.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if f.is_infinite() {
        return if f < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if f == 0.0 {
        return if f.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    // Scientific form with PRECISION significant digits tells us the
    // exponent after rounding.
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, f);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if exp < -4 || exp >= PRECISION {
        let mantissa = strip_fraction_zeros(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp) as usize;
        strip_fraction_zeros(&format!("{f:.decimals$}")).to_string()
    }
}

fn strip_fraction_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Text of a number as `tostring` and concatenation produce it.
pub fn number_to_string(v: TValue) -> Option<String> {
    match v {
        TValue::Int(i) => Some(i.to_string()),
        TValue::Float(f) => Some(format_float(f)),
        _ => None,
    }
}

/// Convert a value to string for concatenation. Only strings and numbers
/// convert.
pub fn to_string_for_concat(v: TValue, strings: &mut StringInterner) -> Option<StringId> {
    match v {
        TValue::String(id) => Some(id),
        _ => number_to_string(v).map(|s| strings.intern(s.as_bytes())),
    }
}
