use super::helpers::*;
use selenite_core::{Lua, LuaError, LuaType, TValue, Varargs};

// ---- __index ----

#[test]
fn test_index_table_chain() {
    let mut lua = Lua::new();
    let defaults = lua.create_table();
    lua.set_field(defaults, "color", int(3)).unwrap();
    let obj = lua.create_table();
    attach_metatable(&mut lua, obj, &[("__index", defaults)]);
    assert_eq!(lua.get_field(obj, "color").unwrap(), int(3));
    lua.set_field(obj, "color", int(4)).unwrap();
    assert_eq!(lua.get_field(obj, "color").unwrap(), int(4));
    assert_eq!(lua.get_field(defaults, "color").unwrap(), int(3));
}

#[test]
fn test_index_existing_key_skips_handler() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    lua.set_field(t, "x", int(1)).unwrap();
    let failing = lua.create_function("fail", |_, _| Err(LuaError::runtime("handler ran")));
    attach_metatable(&mut lua, t, &[("__index", failing)]);
    assert_eq!(lua.get_field(t, "x").unwrap(), int(1));
    assert_eq!(err_msg(lua.get_field(t, "y")), "handler ran");
}

#[test]
fn test_index_two_cycle_raises_loop_error() {
    let mut lua = Lua::new();
    let a = lua.create_table();
    let b = lua.create_table();
    attach_metatable(&mut lua, a, &[("__index", b)]);
    attach_metatable(&mut lua, b, &[("__index", a)]);
    let result = lua.get_field(a, "nowhere");
    assert!(matches!(result, Err(LuaError::LoopBound("gettable"))));
}

#[test]
fn test_self_referential_index_raises_loop_error() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    let mt = lua.create_table();
    lua.set_field(mt, "__index", mt).unwrap();
    lua.set_metatable(t, mt).unwrap();
    let mt2 = lua.create_table();
    lua.set_field(mt2, "__index", t).unwrap();
    lua.set_metatable(mt, mt2).unwrap();
    assert_eq!(err_msg(lua.get_field(t, "k")), "loop in gettable");
}

// ---- __newindex ----

#[test]
fn test_newindex_function_receives_all_arguments() {
    let mut lua = Lua::new();
    let log = lua.create_table();
    let t = lua.create_table();
    let handler = lua.create_closure("record", vec![log], |lua, captures, args| {
        let log = captures[0];
        lua.raw_seti(log, 1, args.get(2))?;
        lua.raw_seti(log, 2, args.get(3))?;
        Ok(Varargs::None)
    });
    attach_metatable(&mut lua, t, &[("__newindex", handler)]);
    lua.set_field(t, "answer", int(42)).unwrap();
    assert_eq!(text(&lua, lua.raw_geti(log, 1).unwrap()), "answer");
    assert_eq!(lua.raw_geti(log, 2).unwrap(), int(42));
    let key = lua.create_string("answer");
    assert!(lua.raw_get(t, key).unwrap().is_nil());
}

#[test]
fn test_newindex_on_userdata() {
    let mut lua = Lua::new();
    let ud = lua.create_userdata(String::from("host"));
    let store = lua.create_table();
    attach_metatable(&mut lua, ud, &[("__newindex", store), ("__index", store)]);
    lua.set_field(ud, "x", int(5)).unwrap();
    assert_eq!(lua.get_field(ud, "x").unwrap(), int(5));
    assert_eq!(lua.get_field(store, "x").unwrap(), int(5));
}

// ---- protected metatables ----

#[test]
fn test_metatable_field_hides_and_protects() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    let secret = lua.create_string("not yours");
    attach_metatable(&mut lua, t, &[("__metatable", secret)]);
    assert_eq!(lua.get_metatable(t), secret);
    assert_eq!(
        err_msg(lua.set_metatable(t, TValue::nil())),
        "cannot change a protected metatable"
    );
}

// ---- shared per-kind metatables ----

#[test]
fn test_string_methods_through_shared_metatable() {
    let mut lua = Lua::new();
    let methods = lua.create_table();
    let len = lua.create_function("len", |lua, args| {
        let n = lua.raw_len(args.first())?;
        Ok(Varargs::from(TValue::from_integer(n)))
    });
    lua.set_field(methods, "len", len).unwrap();
    let mt = lua.create_table();
    lua.set_field(mt, "__index", methods).unwrap();
    let saved = lua.type_metatables();
    lua.set_type_metatable(LuaType::String, mt.as_table_idx())
        .unwrap();

    let s = lua.create_string("hello");
    let result = lua.invoke_method(s, "len", ()).unwrap();
    assert_eq!(result.first(), int(5));

    lua.restore_type_metatables(saved);
    assert!(lua.get_field(s, "len").is_err());
}

#[test]
fn test_shared_metatable_does_not_leak_between_states() {
    let mut a = Lua::new();
    let b = Lua::new();
    let mt = a.create_table().as_table_idx();
    a.set_type_metatable(LuaType::Number, mt).unwrap();
    assert!(a.type_metatable(LuaType::Number).is_some());
    assert!(b.type_metatable(LuaType::Number).is_none());
}

#[test]
fn test_number_arith_metamethods_are_not_consulted_for_numbers() {
    let mut lua = Lua::new();
    let mt = lua.create_table();
    let handler = constant_fn(&mut lua, int(-1));
    lua.set_field(mt, "__add", handler).unwrap();
    lua.set_type_metatable(LuaType::Number, mt.as_table_idx())
        .unwrap();
    assert_eq!(lua.add(int(1), int(2)).unwrap(), int(3));
    assert_eq!(lua.add(int(1), TValue::from_bool(true)).unwrap(), int(-1));
}

// ---- tostring ----

#[test]
fn test_tostring_uses_handler() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    let label = lua.create_string("<point>");
    let handler = constant_fn(&mut lua, label);
    attach_metatable(&mut lua, t, &[("__tostring", handler)]);
    let s = lua.tostring(t).unwrap();
    assert_eq!(text(&lua, s), "<point>");
    let plain = lua.tostring(float(1e100)).unwrap();
    assert_eq!(text(&lua, plain), "1e+100");
}
