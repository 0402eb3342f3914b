use selenite_core::{Lua, LuaResult, TValue, Varargs};

pub fn int(i: i64) -> TValue {
    TValue::from_integer(i)
}

pub fn float(f: f64) -> TValue {
    TValue::from_float(f)
}

/// A function that ignores its arguments and returns `result`.
pub fn constant_fn(lua: &mut Lua, result: TValue) -> TValue {
    lua.create_function("constant", move |_, _| Ok(Varargs::from(result)))
}

/// A fresh metatable with the given fields, attached to `target`.
pub fn attach_metatable(lua: &mut Lua, target: TValue, fields: &[(&str, TValue)]) -> TValue {
    let mt = lua.create_table();
    for (name, value) in fields {
        lua.set_field(mt, name, *value)
            .unwrap_or_else(|e| panic!("setting {name}: {e}"));
    }
    lua.set_metatable(target, mt)
        .unwrap_or_else(|e| panic!("set_metatable: {e}"));
    mt
}

/// Contents of a string value.
pub fn text(lua: &Lua, v: TValue) -> String {
    lua.string_lossy(v)
        .unwrap_or_else(|| panic!("expected a string, got {v:?}"))
        .into_owned()
}

/// Message of an expected error.
pub fn err_msg<T: std::fmt::Debug>(result: LuaResult<T>) -> String {
    match result {
        Err(e) => e.to_string(),
        Ok(v) => panic!("expected error, got {v:?}"),
    }
}

/// Every key of `t`, in traversal order.
pub fn keys(lua: &Lua, t: TValue) -> Vec<TValue> {
    let mut out = Vec::new();
    let mut key = TValue::nil();
    while let Some((k, _)) = lua.next(t, key).expect("next failed") {
        out.push(k);
        key = k;
    }
    out
}
