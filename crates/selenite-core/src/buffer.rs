//! Amortized string building for chains of `..`.

use crate::coerce;
use crate::error::LuaResult;
use crate::state::Lua;
use crate::value::TValue;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
enum Content {
    /// Text of a string built from strings and numbers only.
    Bytes(VecDeque<u8>),
    /// A value that is not (yet) flattened to bytes.
    Value(TValue),
}

/// Accumulates `acc = acc .. v` and `acc = v .. acc` steps. Strings and
/// numbers are copied into a double-ended byte buffer; any other operand
/// goes through [`Lua::concat`] so `__concat` handlers see exactly the
/// operands a pairwise evaluation would give them.
#[derive(Debug, Clone)]
pub struct ConcatBuffer {
    content: Content,
}

impl ConcatBuffer {
    /// An empty buffer; its value is the empty string.
    pub fn new() -> Self {
        ConcatBuffer {
            content: Content::Bytes(VecDeque::new()),
        }
    }

    /// A buffer whose current value is `v`.
    pub fn from_value(v: TValue) -> Self {
        ConcatBuffer {
            content: Content::Value(v),
        }
    }

    /// `acc = acc .. v`
    pub fn append(&mut self, lua: &mut Lua, v: TValue) -> LuaResult<()> {
        if is_plain(v) {
            if let Some(buf) = self.bytes_mut(lua) {
                buf.extend(plain_bytes(lua, v));
                return Ok(());
            }
        }
        let acc = self.value(lua);
        self.content = Content::Value(lua.concat(acc, v)?);
        Ok(())
    }

    /// `acc = v .. acc`
    pub fn prepend(&mut self, lua: &mut Lua, v: TValue) -> LuaResult<()> {
        if is_plain(v) {
            if let Some(buf) = self.bytes_mut(lua) {
                for &b in plain_bytes(lua, v).iter().rev() {
                    buf.push_front(b);
                }
                return Ok(());
            }
        }
        let acc = self.value(lua);
        self.content = Content::Value(lua.concat(v, acc)?);
        Ok(())
    }

    /// The accumulated value.
    pub fn value(&mut self, lua: &mut Lua) -> TValue {
        match &mut self.content {
            Content::Value(v) => *v,
            Content::Bytes(buf) => {
                let s = lua.create_string(&*buf.make_contiguous());
                self.content = Content::Value(s);
                s
            }
        }
    }

    /// Byte view of the accumulator, converting a plain value first.
    /// `None` when the accumulator is not a string or number.
    fn bytes_mut(&mut self, lua: &Lua) -> Option<&mut VecDeque<u8>> {
        if let Content::Value(v) = self.content {
            if !is_plain(v) {
                return None;
            }
            self.content = Content::Bytes(plain_bytes(lua, v).into_iter().collect());
        }
        match &mut self.content {
            Content::Bytes(buf) => Some(buf),
            Content::Value(_) => None,
        }
    }
}

impl Default for ConcatBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn is_plain(v: TValue) -> bool {
    v.is_string() || v.is_number()
}

fn plain_bytes(lua: &Lua, v: TValue) -> Vec<u8> {
    match lua.string_bytes(v) {
        Some(bytes) => bytes.to_vec(),
        None => coerce::number_to_string(v)
            .map(String::into_bytes)
            .unwrap_or_default(),
    }
}
