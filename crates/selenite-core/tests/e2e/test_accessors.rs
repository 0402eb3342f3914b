use super::helpers::*;
use selenite_core::{Lua, LuaResult, TValue, Varargs};

/// A host function in the style of `string.rep(s, n [, sep])`.
fn rep(lua: &mut Lua, args: Varargs) -> LuaResult<Varargs> {
    let s = args.check_string(lua, 1)?;
    let n = args.check_integer(lua, 2)?;
    let sep = args.opt_string(lua, 3, "")?;
    args.arg_check(n >= 0, 2, "count must be non-negative")?;
    let piece = lua.strings.get_bytes(s).to_vec();
    let sep = lua.strings.get_bytes(sep).to_vec();
    let mut out = Vec::new();
    for i in 0..n {
        if i > 0 {
            out.extend_from_slice(&sep);
        }
        out.extend_from_slice(&piece);
    }
    Ok(Varargs::from(lua.create_string(out)))
}

#[test]
fn test_library_style_function() {
    let mut lua = Lua::new();
    let f = lua.create_function("rep", rep);
    let ab = lua.create_string("ab");
    let dash = lua.create_string("-");
    let r = lua.call(f, [ab, int(3), dash]).unwrap();
    assert_eq!(text(&lua, r), "ab-ab-ab");
    // Numbers are accepted where strings are expected.
    let r = lua.call(f, [int(7), float(2.0)]).unwrap();
    assert_eq!(text(&lua, r), "77");
}

#[test]
fn test_library_style_errors() {
    let mut lua = Lua::new();
    let f = lua.create_function("rep", rep);
    let ab = lua.create_string("ab");
    assert_eq!(
        err_msg(lua.call(f, [ab, TValue::nil()])),
        "bad argument #2: number expected, got nil"
    );
    assert_eq!(
        err_msg(lua.call(f, [ab, int(-1)])),
        "bad argument #2: count must be non-negative"
    );
    let t = lua.create_table();
    assert_eq!(
        err_msg(lua.call(f, [ab, int(1), t])),
        "bad argument #3: string expected, got table"
    );
    assert_eq!(
        err_msg(lua.call(f, ())),
        "bad argument #1: string expected, got nil"
    );
}

#[test]
fn test_to_family_defaults() {
    let mut lua = Lua::new();
    let f = lua.create_function("f", |_, _| Ok(Varargs::None));
    assert_eq!(lua.to_integer(f), 0);
    assert_eq!(lua.to_number(f), 0.0);
    assert!(lua.to_lua_string(f).is_nil());
    assert!(lua.to_boolean(f));
    assert!(!lua.to_boolean(TValue::from_bool(false)));
}

#[test]
fn test_opt_family() {
    let mut lua = Lua::new();
    assert_eq!(lua.opt_number(TValue::nil(), 1.5).unwrap(), 1.5);
    assert_eq!(lua.opt_number(int(2), 1.5).unwrap(), 2.0);
    let s = lua.create_string("x");
    assert!(lua.opt_number(s, 1.5).is_err());
    let dflt = lua.create_function("d", |_, _| Ok(Varargs::None));
    assert_eq!(lua.opt_function(TValue::nil(), dflt).unwrap(), dflt);
    assert!(lua.opt_function(int(1), dflt).is_err());
}
