//! Metamethod names and lookup.

use crate::state::Lua;
use crate::string::{StringId, StringInterner};
use crate::value::TValue;

/// Every event name the runtime recognizes in a metatable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetaMethod {
    Index,
    NewIndex,
    Call,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    Unm,
    IDiv,
    BAnd,
    BOr,
    BXor,
    Shl,
    Shr,
    BNot,
    Len,
    Eq,
    Lt,
    Le,
    Concat,
    ToString,
    Name,
    Metatable,
    Mode,
    Close,
    Gc,
}

const COUNT: usize = 28;

impl MetaMethod {
    pub const ALL: [MetaMethod; COUNT] = [
        MetaMethod::Index,
        MetaMethod::NewIndex,
        MetaMethod::Call,
        MetaMethod::Add,
        MetaMethod::Sub,
        MetaMethod::Mul,
        MetaMethod::Div,
        MetaMethod::Mod,
        MetaMethod::Pow,
        MetaMethod::Unm,
        MetaMethod::IDiv,
        MetaMethod::BAnd,
        MetaMethod::BOr,
        MetaMethod::BXor,
        MetaMethod::Shl,
        MetaMethod::Shr,
        MetaMethod::BNot,
        MetaMethod::Len,
        MetaMethod::Eq,
        MetaMethod::Lt,
        MetaMethod::Le,
        MetaMethod::Concat,
        MetaMethod::ToString,
        MetaMethod::Name,
        MetaMethod::Metatable,
        MetaMethod::Mode,
        MetaMethod::Close,
        MetaMethod::Gc,
    ];

    /// The metatable key, e.g. `"__index"`.
    pub const fn name(self) -> &'static str {
        match self {
            MetaMethod::Index => "__index",
            MetaMethod::NewIndex => "__newindex",
            MetaMethod::Call => "__call",
            MetaMethod::Add => "__add",
            MetaMethod::Sub => "__sub",
            MetaMethod::Mul => "__mul",
            MetaMethod::Div => "__div",
            MetaMethod::Mod => "__mod",
            MetaMethod::Pow => "__pow",
            MetaMethod::Unm => "__unm",
            MetaMethod::IDiv => "__idiv",
            MetaMethod::BAnd => "__band",
            MetaMethod::BOr => "__bor",
            MetaMethod::BXor => "__bxor",
            MetaMethod::Shl => "__shl",
            MetaMethod::Shr => "__shr",
            MetaMethod::BNot => "__bnot",
            MetaMethod::Len => "__len",
            MetaMethod::Eq => "__eq",
            MetaMethod::Lt => "__lt",
            MetaMethod::Le => "__le",
            MetaMethod::Concat => "__concat",
            MetaMethod::ToString => "__tostring",
            MetaMethod::Name => "__name",
            MetaMethod::Metatable => "__metatable",
            MetaMethod::Mode => "__mode",
            MetaMethod::Close => "__close",
            MetaMethod::Gc => "__gc",
        }
    }
}

/// Pre-interned metamethod name StringIds for fast lookup.
pub struct MetamethodNames {
    ids: [StringId; COUNT],
}

impl MetamethodNames {
    pub fn init(strings: &mut StringInterner) -> Self {
        MetamethodNames {
            ids: MetaMethod::ALL.map(|mm| strings.intern_str(mm.name())),
        }
    }

    #[inline]
    pub fn get(&self, mm: MetaMethod) -> StringId {
        self.ids[mm as usize]
    }

    /// All names, for rooting them across collections.
    pub fn ids(&self) -> &[StringId] {
        &self.ids
    }
}

impl Lua {
    /// Look up a metamethod on a value: the table's or userdata's own
    /// metatable, or the shared metatable for its kind. Returns `None`
    /// when the event is absent or nil.
    pub fn get_metamethod(&self, val: TValue, mm: MetaMethod) -> Option<TValue> {
        let mt = self.metatable_of(val)?;
        let handler = self.gc.get_table(mt).raw_get_str(self.names.get(mm));
        (!handler.is_nil()).then_some(handler)
    }

    /// First handler found on `a`, then `b`.
    pub(crate) fn binary_metamethod(&self, a: TValue, b: TValue, mm: MetaMethod) -> Option<TValue> {
        self.get_metamethod(a, mm)
            .or_else(|| self.get_metamethod(b, mm))
    }
}
