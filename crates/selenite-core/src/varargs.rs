//! Multiple values: call arguments and return values.
//!
//! Zero, one and two values are stored inline. Longer sequences share an
//! `Rc<[TValue]>` so that `subargs` and `prepend` never copy.

use crate::error::{LuaError, LuaResult};
use crate::state::Lua;
use crate::value::TValue;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::trace;

/// An ordered, 1-indexed sequence of values. Reading past the end yields nil.
#[derive(Clone, Debug, Default)]
pub enum Varargs {
    #[default]
    None,
    One(TValue),
    Pair(TValue, TValue),
    /// `values[start..]` followed by `more`.
    Slice {
        values: Rc<[TValue]>,
        start: usize,
        more: Option<Rc<Varargs>>,
    },
    /// One value in front of another sequence.
    Prepend(TValue, Rc<Varargs>),
    /// A call not made yet. Reads as empty until evaluated.
    TailCall(Rc<TailCall>),
}

/// A deferred call: `func(args)`, run at most once.
#[derive(Debug)]
pub struct TailCall {
    func: TValue,
    args: Varargs,
    result: RefCell<Option<Varargs>>,
}

impl TailCall {
    pub fn func(&self) -> TValue {
        self.func
    }

    pub fn args(&self) -> &Varargs {
        &self.args
    }

    pub fn is_evaluated(&self) -> bool {
        self.result.borrow().is_some()
    }

    /// Run the call, following any tail calls it returns, and cache the
    /// final result here and in every tail call passed through.
    pub fn eval(&self, lua: &mut Lua) -> LuaResult<Varargs> {
        if let Some(done) = self.result.borrow().as_ref() {
            return Ok(done.clone());
        }
        let mut func = self.func;
        let mut args = self.args.clone();
        let mut pending: Vec<Rc<TailCall>> = Vec::new();
        let result = loop {
            trace!(step = pending.len() + 1, callee = ?func, "tail call");
            match lua.invoke_once(func, args)? {
                Varargs::TailCall(next) => {
                    if let Some(done) = next.result.borrow().as_ref() {
                        break done.clone();
                    }
                    func = next.func;
                    args = next.args.clone();
                    pending.push(next);
                }
                other => break other,
            }
        };
        for tail in &pending {
            *tail.result.borrow_mut() = Some(result.clone());
        }
        *self.result.borrow_mut() = Some(result.clone());
        Ok(result)
    }
}

impl Varargs {
    /// Sequence holding exactly `values`.
    pub fn of(values: &[TValue]) -> Varargs {
        match *values {
            [] => Varargs::None,
            [a] => Varargs::One(a),
            [a, b] => Varargs::Pair(a, b),
            _ => Varargs::Slice {
                values: Rc::from(values),
                start: 0,
                more: None,
            },
        }
    }

    /// `values` followed by every value of `more`.
    pub fn with_more(values: &[TValue], more: Varargs) -> Varargs {
        if values.is_empty() {
            return more;
        }
        if more.count() == 0 && !more.is_tail_call() {
            return Varargs::of(values);
        }
        Varargs::Slice {
            values: Rc::from(values),
            start: 0,
            more: Some(Rc::new(more)),
        }
    }

    /// `v` followed by every value of `self`.
    pub fn prepend(self, v: TValue) -> Varargs {
        match self {
            Varargs::None => Varargs::One(v),
            Varargs::One(a) => Varargs::Pair(v, a),
            other => Varargs::Prepend(v, Rc::new(other)),
        }
    }

    /// A call to `func` deferred until [`Varargs::eval`].
    pub fn tail_call(func: TValue, args: impl Into<Varargs>) -> Varargs {
        Varargs::TailCall(Rc::new(TailCall {
            func,
            args: args.into(),
            result: RefCell::new(None),
        }))
    }

    pub fn is_tail_call(&self) -> bool {
        matches!(self, Varargs::TailCall(_))
    }

    /// Resolve a tail call. Any other sequence is returned as is. Evaluating
    /// the same tail call twice runs the callee once.
    pub fn eval(&self, lua: &mut Lua) -> LuaResult<Varargs> {
        match self {
            Varargs::TailCall(call) => call.eval(lua),
            other => Ok(other.clone()),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Varargs::None => 0,
            Varargs::One(_) => 1,
            Varargs::Pair(..) => 2,
            Varargs::Slice {
                values,
                start,
                more,
            } => values.len() - start + more.as_ref().map_or(0, |m| m.count()),
            Varargs::Prepend(_, rest) => 1 + rest.count(),
            Varargs::TailCall(call) => call.result.borrow().as_ref().map_or(0, Varargs::count),
        }
    }

    /// Value `i` (1-based). Nil outside `1..=count()`.
    pub fn get(&self, i: usize) -> TValue {
        if i == 0 {
            return TValue::nil();
        }
        match self {
            Varargs::None => TValue::nil(),
            Varargs::One(a) => if i == 1 { *a } else { TValue::nil() },
            Varargs::Pair(a, b) => match i {
                1 => *a,
                2 => *b,
                _ => TValue::nil(),
            },
            Varargs::Slice {
                values,
                start,
                more,
            } => {
                let local = values.len() - start;
                if i <= local {
                    values[start + i - 1]
                } else {
                    more.as_ref().map_or(TValue::nil(), |m| m.get(i - local))
                }
            }
            Varargs::Prepend(v, rest) => if i == 1 { *v } else { rest.get(i - 1) },
            Varargs::TailCall(call) => call
                .result
                .borrow()
                .as_ref()
                .map_or(TValue::nil(), |r| r.get(i)),
        }
    }

    pub fn first(&self) -> TValue {
        self.get(1)
    }

    /// Whether position `i` holds a value, nil included.
    pub fn is_value(&self, i: usize) -> bool {
        i >= 1 && i <= self.count()
    }

    pub fn is_none_or_nil(&self, i: usize) -> bool {
        self.get(i).is_nil()
    }

    /// Values from position `start` on. `start <= 1` is the whole sequence;
    /// past the end it is empty.
    pub fn subargs(&self, start: usize) -> Varargs {
        if start <= 1 {
            return self.clone();
        }
        match self {
            Varargs::None | Varargs::One(_) => Varargs::None,
            Varargs::Pair(_, b) => {
                if start == 2 {
                    Varargs::One(*b)
                } else {
                    Varargs::None
                }
            }
            Varargs::Slice {
                values,
                start: offset,
                more,
            } => {
                let local = values.len() - offset;
                if start <= local {
                    Varargs::Slice {
                        values: Rc::clone(values),
                        start: offset + start - 1,
                        more: more.clone(),
                    }
                } else {
                    more.as_ref()
                        .map_or(Varargs::None, |m| m.subargs(start - local))
                }
            }
            Varargs::Prepend(_, rest) => rest.subargs(start - 1),
            Varargs::TailCall(call) => call
                .result
                .borrow()
                .as_ref()
                .map_or(Varargs::None, |r| r.subargs(start)),
        }
    }

    /// A copy that shares no backing storage with `self`.
    pub fn dealias(&self) -> Varargs {
        match self {
            Varargs::None | Varargs::One(_) | Varargs::Pair(..) => self.clone(),
            other => {
                let values = other.to_vec();
                if values.len() > 2 {
                    Varargs::Slice {
                        values: Rc::from(values),
                        start: 0,
                        more: None,
                    }
                } else {
                    Varargs::of(&values)
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = TValue> + '_ {
        (1..=self.count()).map(move |i| self.get(i))
    }

    pub fn to_vec(&self) -> Vec<TValue> {
        self.iter().collect()
    }

    /// Raise an argument error at position `i` unless `test` holds.
    pub fn arg_check(&self, test: bool, i: usize, msg: &str) -> LuaResult<()> {
        if test {
            Ok(())
        } else {
            Err(LuaError::argument(msg).at_argument(i))
        }
    }
}

impl From<TValue> for Varargs {
    fn from(v: TValue) -> Self {
        Varargs::One(v)
    }
}

impl From<Vec<TValue>> for Varargs {
    fn from(values: Vec<TValue>) -> Self {
        if values.len() > 2 {
            Varargs::Slice {
                values: Rc::from(values),
                start: 0,
                more: None,
            }
        } else {
            Varargs::of(&values)
        }
    }
}

impl From<&[TValue]> for Varargs {
    fn from(values: &[TValue]) -> Self {
        Varargs::of(values)
    }
}

impl<const N: usize> From<[TValue; N]> for Varargs {
    fn from(values: [TValue; N]) -> Self {
        Varargs::of(&values)
    }
}

impl From<()> for Varargs {
    fn from(_: ()) -> Self {
        Varargs::None
    }
}
