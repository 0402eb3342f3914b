use super::helpers::*;
use selenite_core::{Config, Lua, LuaError};

#[test]
fn test_partial_config_from_json() {
    let cfg: Config = serde_json::from_str(r#"{ "max_tag_loop": 3 }"#).unwrap();
    assert_eq!(cfg.max_tag_loop, 3);
    assert_eq!(cfg.max_call_depth, Config::default().max_call_depth);
}

#[test]
fn test_tag_loop_bound_is_configurable() {
    let cfg: Config = serde_json::from_str(r#"{ "max_tag_loop": 3 }"#).unwrap();
    let mut lua = Lua::with_config(cfg);
    // A chain of four links: one more than allowed.
    let mut top = lua.create_table();
    lua.set_field(top, "found", int(1)).unwrap();
    for _ in 0..4 {
        let t = lua.create_table();
        attach_metatable(&mut lua, t, &[("__index", top)]);
        top = t;
    }
    assert!(matches!(lua.get_field(top, "found"), Err(LuaError::LoopBound("gettable"))));

    let mut lua = Lua::new();
    let mut top = lua.create_table();
    lua.set_field(top, "found", int(1)).unwrap();
    for _ in 0..4 {
        let t = lua.create_table();
        attach_metatable(&mut lua, t, &[("__index", top)]);
        top = t;
    }
    assert_eq!(lua.get_field(top, "found").unwrap(), int(1));
}

#[test]
fn test_table_hints_preallocate() {
    let cfg = Config {
        table_array_hint: 16,
        ..Config::default()
    };
    let mut lua = Lua::with_config(cfg);
    let t = lua.create_table();
    assert_eq!(lua.raw_len(t).unwrap(), 0);
    assert_eq!(lua.config().table_array_hint, 16);
}

#[test]
fn test_config_round_trip() {
    let cfg = Config {
        max_call_depth: 64,
        ..Config::default()
    };
    let json = serde_json::to_string(&cfg).unwrap();
    let back: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(back, cfg);
}
