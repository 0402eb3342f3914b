use super::helpers::*;
use selenite_core::{Config, Lua, LuaError, TValue, Varargs};

#[test]
fn test_call_chain_through_call_metamethods() {
    let mut lua = Lua::new();
    let inner = lua.create_table();
    let outer = lua.create_table();
    let f = lua.create_function("count", |_, args| {
        Ok(Varargs::from(TValue::from_integer(args.count() as i64)))
    });
    attach_metatable(&mut lua, inner, &[("__call", f)]);
    attach_metatable(&mut lua, outer, &[("__call", inner)]);
    // outer(1) -> inner(outer, 1) -> f(inner, outer, 1)
    assert_eq!(lua.call(outer, int(1)).unwrap(), int(3));
}

#[test]
fn test_calling_nil_fails() {
    let mut lua = Lua::new();
    assert_eq!(err_msg(lua.call(TValue::nil(), ())), "attempt to call a nil value");
}

#[test]
fn test_errors_carry_values() {
    let mut lua = Lua::new();
    let payload = lua.create_table();
    let thrower = lua.create_function("throw", |_, args| Err(LuaError::Value(args.first())));
    let err = lua.call(thrower, payload).unwrap_err();
    assert_eq!(err.to_tvalue(&mut lua.strings), payload);
    let err = lua.call(TValue::nil(), ()).unwrap_err();
    let msg = err.to_tvalue(&mut lua.strings);
    assert_eq!(text(&lua, msg), "attempt to call a nil value");
}

#[test]
fn test_stack_overflow_is_reported_and_recovers() {
    let mut lua = Lua::with_config(Config {
        max_call_depth: 50,
        ..Config::default()
    });
    let depth = lua.create_function("depth", |lua, args| {
        let n = args.check_integer(lua, 1)?;
        if n == 0 {
            return Ok(Varargs::None);
        }
        let me = lua.get_field(lua.registry(), "depth")?;
        lua.invoke(me, int(n - 1))
    });
    let reg = lua.registry();
    lua.set_field(reg, "depth", depth).unwrap();
    assert!(matches!(lua.call(depth, int(1000)), Err(LuaError::StackOverflow)));
    assert!(lua.call(depth, int(10)).is_ok());
}

#[test]
fn test_invoke_method() {
    let mut lua = Lua::new();
    let account = lua.create_table();
    lua.set_field(account, "balance", int(100)).unwrap();
    let withdraw = lua.create_function("withdraw", |lua, args| {
        let this = args.check_table(lua, 1).map(TValue::from_table)?;
        let amount = args.check_integer(lua, 2)?;
        let balance = lua.get_field(this, "balance")?;
        let balance = lua.sub(balance, TValue::from_integer(amount))?;
        lua.set_field(this, "balance", balance)?;
        Ok(Varargs::from(balance))
    });
    lua.set_field(account, "withdraw", withdraw).unwrap();
    let left = lua.invoke_method(account, "withdraw", int(30)).unwrap();
    assert_eq!(left.first(), int(70));
    assert_eq!(
        err_msg(lua.invoke_method(account, "withdraw", TValue::from_bool(true))),
        "bad argument #2: number expected, got boolean"
    );
}

#[test]
fn test_closure_captures_survive_collection() {
    let mut lua = Lua::new();
    let captured = lua.create_table();
    lua.set_field(captured, "n", int(5)).unwrap();
    let getter = lua.create_closure("get", vec![captured], |lua, caps, _| {
        Ok(Varargs::from(lua.get_field(caps[0], "n")?))
    });
    lua.collect_garbage(&[getter]);
    assert!(lua.is_live(captured));
    assert_eq!(lua.call(getter, ()).unwrap(), int(5));
    lua.collect_garbage(&[]);
    assert!(!lua.is_live(getter));
    assert!(!lua.is_live(captured));
}
