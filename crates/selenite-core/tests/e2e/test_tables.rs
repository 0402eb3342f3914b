use super::helpers::*;
use selenite_core::{Lua, TValue};

#[test]
fn test_rawset_nil_removes_key() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    let k = lua.create_string("gone");
    lua.raw_set(t, k, int(1)).unwrap();
    lua.raw_seti(t, 1, int(2)).unwrap();
    assert!(keys(&lua, t).contains(&k));
    lua.raw_set(t, k, TValue::nil()).unwrap();
    assert!(lua.raw_get(t, k).unwrap().is_nil());
    assert!(!keys(&lua, t).contains(&k));
    assert_eq!(keys(&lua, t), vec![int(1)]);
}

#[test]
fn test_float_keys_normalize() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    lua.raw_set(t, float(2.0), int(20)).unwrap();
    assert_eq!(lua.raw_geti(t, 2).unwrap(), int(20));
    lua.raw_set(t, float(2.5), int(25)).unwrap();
    assert_eq!(lua.raw_get(t, float(2.5)).unwrap(), int(25));
    assert!(lua.raw_geti(t, 3).unwrap().is_nil());
}

#[test]
fn test_invalid_keys() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    assert_eq!(err_msg(lua.raw_set(t, TValue::nil(), int(1))), "table index is nil");
    assert_eq!(err_msg(lua.raw_set(t, float(f64::NAN), int(1))), "table index is NaN");
    // Reading with such keys is fine and finds nothing.
    assert!(lua.raw_get(t, TValue::nil()).unwrap().is_nil());
    // Assigning nil through the metatable-aware path still checks the key.
    assert!(lua.set_index(t, TValue::nil(), int(1)).is_err());
}

#[test]
fn test_array_part_grows_and_shrinks() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    for i in 1..=10 {
        lua.raw_seti(t, i, int(i * i)).unwrap();
    }
    assert_eq!(lua.raw_len(t).unwrap(), 10);
    lua.raw_seti(t, 10, TValue::nil()).unwrap();
    assert_eq!(lua.raw_len(t).unwrap(), 9);
    // A gap: 20 lives in the hash part and does not extend the border.
    lua.raw_seti(t, 20, int(1)).unwrap();
    assert_eq!(lua.raw_len(t).unwrap(), 9);
    let idx = t.as_table_idx().unwrap();
    assert_eq!(lua.gc.get_table(idx).array_len(), 9);
}

#[test]
fn test_hash_entries_migrate_when_array_catches_up() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    lua.raw_seti(t, 3, int(3)).unwrap();
    lua.raw_seti(t, 2, int(2)).unwrap();
    lua.raw_seti(t, 1, int(1)).unwrap();
    assert_eq!(lua.raw_len(t).unwrap(), 3);
    let idx = t.as_table_idx().unwrap();
    assert_eq!(lua.gc.get_table(idx).array_len(), 3);
    assert_eq!(keys(&lua, t), vec![int(1), int(2), int(3)]);
}

#[test]
fn test_remove_during_traversal() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    for i in 1..=5 {
        lua.raw_seti(t, i, int(i)).unwrap();
    }
    for name in ["a", "b", "c", "d"] {
        let k = lua.create_string(name);
        lua.raw_set(t, k, TValue::from_bool(true)).unwrap();
    }
    let mut seen = 0;
    let mut key = TValue::nil();
    while let Some((k, _)) = lua.next(t, key).unwrap() {
        seen += 1;
        lua.raw_set(t, k, TValue::nil()).unwrap();
        key = k;
    }
    assert_eq!(seen, 9);
    assert!(lua.next(t, TValue::nil()).unwrap().is_none());
}

#[test]
fn test_next_rejects_unknown_key() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    let k = lua.create_string("never-inserted");
    assert_eq!(err_msg(lua.next(t, k)), "invalid key to 'next'");
}

#[test]
fn test_inext_stops_at_first_nil() {
    let mut lua = Lua::new();
    let t = lua.table_from_list(&[int(10), int(20), TValue::nil(), int(40)]);
    assert_eq!(lua.inext(t, 0).unwrap(), Some((1, int(10))));
    assert_eq!(lua.inext(t, 1).unwrap(), Some((2, int(20))));
    assert_eq!(lua.inext(t, 2).unwrap(), None);
}

#[test]
fn test_len_respects_metamethod_but_raw_len_does_not() {
    let mut lua = Lua::new();
    let t = lua.table_from_list(&[int(1), int(2), int(3)]);
    let handler = constant_fn(&mut lua, int(100));
    attach_metatable(&mut lua, t, &[("__len", handler)]);
    assert_eq!(lua.len(t).unwrap(), int(100));
    assert_eq!(lua.raw_len(t).unwrap(), 3);
}

#[test]
fn test_table_can_contain_itself() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    lua.set_field(t, "me", t).unwrap();
    assert_eq!(lua.get_field(t, "me").unwrap(), t);
    lua.collect_garbage(&[t]);
    assert!(lua.is_live(t));
    lua.collect_garbage(&[]);
    assert!(!lua.is_live(t));
}
