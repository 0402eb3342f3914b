use super::helpers::*;
use proptest::prelude::*;
use selenite_core::{ConcatBuffer, Lua, TValue, Varargs};

#[test]
fn test_buffer_builds_text() {
    let mut lua = Lua::new();
    let mut buf = ConcatBuffer::new();
    for i in 1..=3 {
        buf.append(&mut lua, int(i)).unwrap();
        let sep = lua.create_string(",");
        buf.append(&mut lua, sep).unwrap();
    }
    let open = lua.create_string("[");
    buf.prepend(&mut lua, open).unwrap();
    let v = buf.value(&mut lua);
    assert_eq!(text(&lua, v), "[1,2,3,");
}

#[test]
fn test_buffer_value_can_be_read_midway() {
    let mut lua = Lua::new();
    let mut buf = ConcatBuffer::new();
    let a = lua.create_string("a");
    buf.append(&mut lua, a).unwrap();
    let first = buf.value(&mut lua);
    buf.append(&mut lua, float(0.5)).unwrap();
    let second = buf.value(&mut lua);
    assert_eq!(text(&lua, first), "a");
    assert_eq!(text(&lua, second), "a0.5");
}

#[test]
fn test_buffer_with_concat_handler_matches_pairwise() {
    let mut lua = Lua::new();
    let obj = lua.create_table();
    let handler = lua.create_function("concat", |lua, args| {
        let left = if args.get(1).is_table() { lua.create_string("<obj>") } else { args.get(1) };
        let right = if args.get(2).is_table() { lua.create_string("<obj>") } else { args.get(2) };
        Ok(Varargs::from(lua.concat(left, right)?))
    });
    attach_metatable(&mut lua, obj, &[("__concat", handler)]);
    let x = lua.create_string("x");

    let mut buf = ConcatBuffer::from_value(x);
    buf.append(&mut lua, obj).unwrap();
    buf.prepend(&mut lua, int(1)).unwrap();
    buf.prepend(&mut lua, obj).unwrap();

    let mut naive = lua.concat(x, obj).unwrap();
    naive = lua.concat(int(1), naive).unwrap();
    naive = lua.concat(obj, naive).unwrap();
    assert_eq!(buf.value(&mut lua), naive);
    assert_eq!(text(&lua, naive), "<obj>1x<obj>");
}

#[derive(Debug, Clone)]
enum Op {
    Append(TextOrNumber),
    Prepend(TextOrNumber),
}

#[derive(Debug, Clone)]
enum TextOrNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

fn piece() -> impl Strategy<Value = TextOrNumber> {
    prop_oneof![
        "[a-z0-9 ]{0,5}".prop_map(TextOrNumber::Text),
        any::<i64>().prop_map(TextOrNumber::Int),
        (-1e6f64..1e6).prop_map(TextOrNumber::Float),
    ]
}

fn to_value(lua: &mut Lua, p: &TextOrNumber) -> TValue {
    match p {
        TextOrNumber::Text(s) => lua.create_string(s),
        TextOrNumber::Int(i) => int(*i),
        TextOrNumber::Float(f) => float(*f),
    }
}

proptest! {
    #[test]
    fn prop_buffer_equals_pairwise_concat(
        seed in piece(),
        ops in proptest::collection::vec(
            prop_oneof![piece().prop_map(Op::Append), piece().prop_map(Op::Prepend)],
            1..24,
        ),
    ) {
        let mut lua = Lua::new();
        let start = to_value(&mut lua, &seed);
        let mut buf = ConcatBuffer::from_value(start);
        let mut naive = start;
        for op in &ops {
            match op {
                Op::Append(p) => {
                    let v = to_value(&mut lua, p);
                    buf.append(&mut lua, v).unwrap();
                    naive = lua.concat(naive, v).unwrap();
                }
                Op::Prepend(p) => {
                    let v = to_value(&mut lua, p);
                    buf.prepend(&mut lua, v).unwrap();
                    naive = lua.concat(v, naive).unwrap();
                }
            }
        }
        prop_assert_eq!(buf.value(&mut lua), naive);
    }
}
