//! Calling values: `__call` resolution, the call-depth guard and tail-call
//! evaluation.

use crate::error::{LuaError, LuaResult};
use crate::metamethod::MetaMethod;
use crate::object::LuaCallable;
use crate::state::Lua;
use crate::value::TValue;
use crate::varargs::Varargs;
use std::rc::Rc;

impl Lua {
    /// Call `func` and return all results, running any tail calls it
    /// hands back.
    pub fn invoke(&mut self, func: TValue, args: impl Into<Varargs>) -> LuaResult<Varargs> {
        self.invoke_once(func, args.into())?.eval(self)
    }

    /// Call `func` and keep only its first result.
    pub fn call(&mut self, func: TValue, args: impl Into<Varargs>) -> LuaResult<TValue> {
        Ok(self.invoke(func, args)?.first())
    }

    /// `obj:name(args...)`
    pub fn invoke_method(
        &mut self,
        obj: TValue,
        name: &str,
        args: impl Into<Varargs>,
    ) -> LuaResult<Varargs> {
        let method = self.get_field(obj, name)?;
        let args: Varargs = args.into();
        self.invoke(method, args.prepend(obj))
    }

    /// A call in tail position. Nothing runs until the result is evaluated.
    pub fn tailcall_of(&self, func: TValue, args: impl Into<Varargs>) -> Varargs {
        Varargs::tail_call(func, args)
    }

    /// One call step. A tail call returned by the callee is passed back
    /// unevaluated.
    pub(crate) fn invoke_once(&mut self, func: TValue, args: Varargs) -> LuaResult<Varargs> {
        let (body, args) = self.resolve_callable(func, args)?;
        if self.call_depth >= self.config().max_call_depth {
            return Err(LuaError::StackOverflow);
        }
        self.call_depth += 1;
        let result = body.on_invoke(self, args);
        self.call_depth -= 1;
        result
    }

    /// Follow `__call` handlers to a function, prepending each callee to the
    /// arguments on the way.
    fn resolve_callable(
        &self,
        func: TValue,
        args: Varargs,
    ) -> LuaResult<(Rc<dyn LuaCallable>, Varargs)> {
        let mut func = func;
        let mut args = args;
        for _ in 0..self.config().max_tag_loop {
            if let TValue::Function(idx) = func {
                return Ok((Rc::clone(&self.gc.get_function(idx).body), args));
            }
            match self.get_metamethod(func, MetaMethod::Call) {
                Some(handler) => {
                    args = args.prepend(func);
                    func = handler;
                }
                None => {
                    return Err(LuaError::Type(format!(
                        "attempt to call a {} value",
                        func.type_name()
                    )))
                }
            }
        }
        Err(LuaError::runtime("'__call' chain too long; possible loop"))
    }
}
