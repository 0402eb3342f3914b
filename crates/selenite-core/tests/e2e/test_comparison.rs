use super::helpers::*;
use selenite_core::{Lua, LuaError, TValue, Varargs};

#[test]
fn test_distinct_tables_are_unequal() {
    let mut lua = Lua::new();
    let a = lua.create_table();
    let b = lua.create_table();
    assert!(!lua.equals(a, b).unwrap());
    assert!(lua.equals(a, a).unwrap());
}

#[test]
fn test_shared_eq_handler_is_used() {
    let mut lua = Lua::new();
    let a = lua.create_table();
    let b = lua.create_table();
    let yes = constant_fn(&mut lua, TValue::from_bool(true));
    let mt = lua.create_table();
    lua.set_field(mt, "__eq", yes).unwrap();
    lua.set_metatable(a, mt).unwrap();
    lua.set_metatable(b, mt).unwrap();
    assert!(lua.equals(a, b).unwrap());
}

#[test]
fn test_same_handler_in_different_metatables_is_used() {
    let mut lua = Lua::new();
    let a = lua.create_table();
    let b = lua.create_table();
    let yes = constant_fn(&mut lua, TValue::from_bool(true));
    attach_metatable(&mut lua, a, &[("__eq", yes)]);
    attach_metatable(&mut lua, b, &[("__eq", yes)]);
    assert!(lua.equals(a, b).unwrap());
}

#[test]
fn test_different_eq_handlers_mean_unequal() {
    let mut lua = Lua::new();
    let a = lua.create_table();
    let b = lua.create_table();
    let yes_a = constant_fn(&mut lua, TValue::from_bool(true));
    let yes_b = constant_fn(&mut lua, TValue::from_bool(true));
    attach_metatable(&mut lua, a, &[("__eq", yes_a)]);
    attach_metatable(&mut lua, b, &[("__eq", yes_b)]);
    assert!(!lua.equals(a, b).unwrap());
    assert!(!lua.equals(b, a).unwrap());
}

#[test]
fn test_eq_handler_needs_both_metatables() {
    let mut lua = Lua::new();
    let a = lua.create_table();
    let b = lua.create_table();
    let yes = constant_fn(&mut lua, TValue::from_bool(true));
    attach_metatable(&mut lua, a, &[("__eq", yes)]);
    assert!(!lua.equals(a, b).unwrap());
}

#[test]
fn test_userdata_eq_and_mixed_kinds() {
    let mut lua = Lua::new();
    let u1 = lua.create_userdata(1u8);
    let u2 = lua.create_userdata(2u8);
    let t = lua.create_table();
    let yes = constant_fn(&mut lua, TValue::from_bool(true));
    let mt = lua.create_table();
    lua.set_field(mt, "__eq", yes).unwrap();
    lua.set_metatable(u1, mt).unwrap();
    lua.set_metatable(u2, mt).unwrap();
    lua.set_metatable(t, mt).unwrap();
    assert!(lua.equals(u1, u2).unwrap());
    // A table and a userdata never reach __eq.
    assert!(!lua.equals(u1, t).unwrap());
}

#[test]
fn test_primitive_equality() {
    let mut lua = Lua::new();
    let s1 = lua.create_string("same");
    let s2 = lua.create_string("same");
    assert!(lua.equals(s1, s2).unwrap());
    assert!(lua.equals(int(2), float(2.0)).unwrap());
    assert!(!lua.equals(float(f64::NAN), float(f64::NAN)).unwrap());
    let one = lua.create_string("1");
    assert!(!lua.equals(one, int(1)).unwrap());
}

#[test]
fn test_ordering_numbers_and_strings() {
    let mut lua = Lua::new();
    assert!(lua.less_than(int(1), int(2)).unwrap());
    assert!(lua.less_equal(float(2.0), int(2)).unwrap());
    assert!(lua.greater_than(int(3), float(2.5)).unwrap());
    assert!(!lua.greater_equal(int(i64::MAX), float(9.3e18)).unwrap());
    let apple = lua.create_string("apple");
    let banana = lua.create_string("banana");
    assert!(lua.less_than(apple, banana).unwrap());
    assert!(lua.greater_than(banana, apple).unwrap());
}

#[test]
fn test_mismatched_comparison_names_both_types() {
    let mut lua = Lua::new();
    let s = lua.create_string("1");
    let t = lua.create_table();
    assert_eq!(err_msg(lua.less_than(int(1), s)), "attempt to compare number with string");
    assert_eq!(err_msg(lua.less_equal(t, t)), "attempt to compare two table values");
    assert_eq!(
        err_msg(lua.greater_than(TValue::nil(), int(1))),
        "attempt to compare number with nil"
    );
}

#[test]
fn test_lt_handler_and_greater_than_swap() {
    let mut lua = Lua::new();
    let small = lua.create_table();
    let big = lua.create_table();
    lua.set_field(small, "v", int(1)).unwrap();
    lua.set_field(big, "v", int(10)).unwrap();
    let lt = lua.create_function("lt", |lua, args| {
        let a = lua.get_field(args.get(1), "v")?;
        let b = lua.get_field(args.get(2), "v")?;
        Ok(Varargs::from(TValue::from_bool(lua.less_than(a, b)?)))
    });
    let mt = lua.create_table();
    lua.set_field(mt, "__lt", lt).unwrap();
    lua.set_metatable(small, mt).unwrap();
    lua.set_metatable(big, mt).unwrap();
    assert!(lua.less_than(small, big).unwrap());
    assert!(lua.greater_than(big, small).unwrap());
    // No __le: a <= b is not (b < a).
    assert!(lua.less_equal(small, big).unwrap());
    assert!(!lua.greater_equal(small, big).unwrap());
}

#[test]
fn test_handler_errors_propagate() {
    let mut lua = Lua::new();
    let t = lua.create_table();
    let boom = lua.create_function("boom", |_, _| Err(LuaError::Value(TValue::from_integer(7))));
    attach_metatable(&mut lua, t, &[("__lt", boom)]);
    match lua.less_than(t, t) {
        Err(LuaError::Value(v)) => assert_eq!(v, int(7)),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_le_fallback_uses_left_lt_first() {
    let mut lua = Lua::new();
    let a = lua.create_table();
    let b = lua.create_table();
    let yes = constant_fn(&mut lua, TValue::from_bool(true));
    let no = constant_fn(&mut lua, TValue::from_bool(false));
    attach_metatable(&mut lua, a, &[("__lt", yes)]);
    attach_metatable(&mut lua, b, &[("__lt", no)]);
    // a <= b is not (b < a), answered by a's handler.
    assert!(!lua.less_equal(a, b).unwrap());
    assert!(lua.less_equal(b, a).unwrap());
    assert!(!lua.greater_equal(b, a).unwrap());
}

#[test]
fn test_le_fallback_with_lt_on_right_only() {
    let mut lua = Lua::new();
    let a = lua.create_table();
    let b = lua.create_table();
    lua.raw_seti(a, 1, TValue::from_bool(true)).unwrap();
    lua.raw_seti(b, 1, TValue::from_bool(false)).unwrap();
    // Answers with the first operand's [1], so the swapped order shows.
    let first_flag = lua.create_function("lt", |lua, args| {
        Ok(Varargs::from(lua.raw_geti(args.get(1), 1)?))
    });
    attach_metatable(&mut lua, b, &[("__lt", first_flag)]);
    assert!(lua.less_equal(a, b).unwrap());
    assert!(!lua.less_equal(b, a).unwrap());
}
