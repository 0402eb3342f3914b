//! The Lua state: owns the heap, the string interner, shared metatables and
//! the registry.

use crate::config::Config;
use crate::error::{LuaError, LuaResult};
use crate::gc::{GcHeap, GcIdx, GcStats};
use crate::metamethod::{MetaMethod, MetamethodNames};
use crate::object::{Closure, Function, LuaCallable, NativeFunction, ThreadStatus, Userdata};
use crate::string::StringInterner;
use crate::table::{Table, WeakMode};
use crate::value::{LuaType, TValue};
use crate::varargs::Varargs;
use std::any::Any;
use std::borrow::Cow;
use std::rc::Rc;
use tracing::trace;

/// Metatables shared by every value of a non-table, non-userdata kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TypeMetatables {
    pub nil: Option<GcIdx<Table>>,
    pub boolean: Option<GcIdx<Table>>,
    pub number: Option<GcIdx<Table>>,
    pub string: Option<GcIdx<Table>>,
    pub function: Option<GcIdx<Table>>,
    pub thread: Option<GcIdx<Table>>,
}

impl TypeMetatables {
    fn slot(&self, ty: LuaType) -> Option<&Option<GcIdx<Table>>> {
        match ty {
            LuaType::Nil => Some(&self.nil),
            LuaType::Boolean => Some(&self.boolean),
            LuaType::Number => Some(&self.number),
            LuaType::String => Some(&self.string),
            LuaType::Function => Some(&self.function),
            LuaType::Thread => Some(&self.thread),
            LuaType::Table | LuaType::Userdata => None,
        }
    }

    fn slot_mut(&mut self, ty: LuaType) -> Option<&mut Option<GcIdx<Table>>> {
        match ty {
            LuaType::Nil => Some(&mut self.nil),
            LuaType::Boolean => Some(&mut self.boolean),
            LuaType::Number => Some(&mut self.number),
            LuaType::String => Some(&mut self.string),
            LuaType::Function => Some(&mut self.function),
            LuaType::Thread => Some(&mut self.thread),
            LuaType::Table | LuaType::Userdata => None,
        }
    }

    pub fn get(&self, ty: LuaType) -> Option<GcIdx<Table>> {
        self.slot(ty).copied().flatten()
    }

    fn iter(&self) -> impl Iterator<Item = GcIdx<Table>> {
        [
            self.nil,
            self.boolean,
            self.number,
            self.string,
            self.function,
            self.thread,
        ]
        .into_iter()
        .flatten()
    }
}

/// A Lua runtime instance. Single-threaded: values from one state must not
/// be used with another.
pub struct Lua {
    pub gc: GcHeap,
    pub strings: StringInterner,
    pub(crate) names: MetamethodNames,
    type_metatables: TypeMetatables,
    registry: GcIdx<Table>,
    config: Config,
    pub(crate) call_depth: usize,
}

impl Lua {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        let mut gc = GcHeap::new();
        let mut strings = StringInterner::new();
        let names = MetamethodNames::init(&mut strings);
        let registry = gc.alloc_table(0, 0);
        Lua {
            gc,
            strings,
            names,
            type_metatables: TypeMetatables::default(),
            registry,
            config,
            call_depth: 0,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // ---- Object creation ----

    /// New empty table, preallocated per the configured hints.
    pub fn create_table(&mut self) -> TValue {
        let (narr, nhash) = (self.config.table_array_hint, self.config.table_hash_hint);
        self.create_table_with(narr, nhash)
    }

    pub fn create_table_with(&mut self, array_hint: usize, hash_hint: usize) -> TValue {
        TValue::from_table(self.gc.alloc_table(array_hint, hash_hint))
    }

    /// Table with `values` at keys `1..=n`. Nils leave holes.
    pub fn table_from_list(&mut self, values: &[TValue]) -> TValue {
        let idx = self.gc.alloc_table(values.len(), 0);
        let table = self.gc.get_table_mut(idx);
        for (i, v) in values.iter().enumerate() {
            table.raw_seti(i as i64 + 1, *v);
        }
        TValue::from_table(idx)
    }

    /// Table from key/value pairs. Fails on a nil or NaN key.
    pub fn table_from_pairs(&mut self, pairs: &[(TValue, TValue)]) -> LuaResult<TValue> {
        let idx = self.gc.alloc_table(0, pairs.len());
        let table = self.gc.get_table_mut(idx);
        for (k, v) in pairs {
            table.raw_set(*k, *v)?;
        }
        Ok(TValue::from_table(idx))
    }

    pub fn create_string(&mut self, bytes: impl AsRef<[u8]>) -> TValue {
        TValue::from_string_id(self.strings.intern(bytes.as_ref()))
    }

    /// Function backed by a plain Rust closure. The collector cannot see
    /// into the closure, so a table or other object it captures is not kept
    /// alive by it. Pass such values through [`Lua::create_closure`] or
    /// store them in the registry.
    pub fn create_function<F>(&mut self, name: &str, func: F) -> TValue
    where
        F: Fn(&mut Lua, Varargs) -> LuaResult<Varargs> + 'static,
    {
        self.create_callable(name, Rc::new(NativeFunction(func)))
    }

    /// Function holding `captures`; they stay alive as long as the
    /// function does.
    pub fn create_closure<F>(&mut self, name: &str, captures: Vec<TValue>, func: F) -> TValue
    where
        F: Fn(&mut Lua, &[TValue], Varargs) -> LuaResult<Varargs> + 'static,
    {
        self.create_callable(name, Rc::new(Closure::new(captures, func)))
    }

    pub fn create_callable(&mut self, name: &str, body: Rc<dyn LuaCallable>) -> TValue {
        let idx = self.gc.alloc_function(Function {
            name: name.to_string(),
            body,
        });
        TValue::from_function(idx)
    }

    pub fn create_userdata<T: Any>(&mut self, data: T) -> TValue {
        TValue::from_userdata(self.gc.alloc_userdata(Box::new(data)))
    }

    pub fn create_thread(&mut self, body: TValue) -> TValue {
        TValue::from_thread(self.gc.alloc_thread(body))
    }

    /// The registry: a table private to the host, always reachable.
    pub fn registry(&self) -> TValue {
        TValue::from_table(self.registry)
    }

    // ---- Object access ----

    pub fn string_bytes(&self, v: TValue) -> Option<&[u8]> {
        v.as_string_id().map(|id| self.strings.get_bytes(id))
    }

    /// String contents as UTF-8, replacing invalid sequences.
    pub fn string_lossy(&self, v: TValue) -> Option<Cow<'_, str>> {
        self.string_bytes(v).map(String::from_utf8_lossy)
    }

    pub fn userdata_ref<T: Any>(&self, v: TValue) -> Option<&T> {
        self.gc.get_userdata(v.as_userdata_idx()?).downcast_ref()
    }

    pub fn userdata_mut<T: Any>(&mut self, v: TValue) -> Option<&mut T> {
        self.gc.get_userdata_mut(v.as_userdata_idx()?).downcast_mut()
    }

    pub fn user_value(&self, v: TValue) -> LuaResult<TValue> {
        let idx = v
            .as_userdata_idx()
            .ok_or_else(|| LuaError::type_mismatch("userdata", v))?;
        Ok(self.gc.get_userdata(idx).user_value)
    }

    pub fn set_user_value(&mut self, v: TValue, value: TValue) -> LuaResult<()> {
        let idx = v
            .as_userdata_idx()
            .ok_or_else(|| LuaError::type_mismatch("userdata", v))?;
        self.gc.get_userdata_mut(idx).user_value = value;
        Ok(())
    }

    pub fn thread_status(&self, v: TValue) -> LuaResult<ThreadStatus> {
        let idx = v
            .as_thread_idx()
            .ok_or_else(|| LuaError::type_mismatch("thread", v))?;
        Ok(self.gc.get_thread(idx).status)
    }

    pub fn set_thread_status(&mut self, v: TValue, status: ThreadStatus) -> LuaResult<()> {
        let idx = v
            .as_thread_idx()
            .ok_or_else(|| LuaError::type_mismatch("thread", v))?;
        self.gc.get_thread_mut(idx).status = status;
        Ok(())
    }

    /// Name a function was created with.
    pub fn function_name(&self, v: TValue) -> Option<&str> {
        v.as_function_idx()
            .map(|idx| self.gc.get_function(idx).name.as_str())
    }

    // ---- Metatables ----

    /// The metatable governing `val`: its own for tables and userdata, the
    /// shared one for its kind otherwise.
    pub fn metatable_of(&self, val: TValue) -> Option<GcIdx<Table>> {
        match val {
            TValue::Table(idx) => self.gc.get_table(idx).metatable,
            TValue::Userdata(idx) => self.gc.get_userdata(idx).metatable,
            other => self.type_metatables.get(other.type_of()),
        }
    }

    /// `getmetatable`: the metatable, or its `__metatable` field when set.
    pub fn get_metatable(&self, val: TValue) -> TValue {
        match self.metatable_of(val) {
            None => TValue::nil(),
            Some(mt) => {
                let protected = self
                    .gc
                    .get_table(mt)
                    .raw_get_str(self.names.get(MetaMethod::Metatable));
                if protected.is_nil() {
                    TValue::from_table(mt)
                } else {
                    protected
                }
            }
        }
    }

    /// `setmetatable` for a table or userdata. `mt` must be a table or nil.
    pub fn set_metatable(&mut self, val: TValue, mt: TValue) -> LuaResult<()> {
        let new_mt = match mt {
            TValue::Nil => None,
            TValue::Table(idx) => Some(idx),
            other => return Err(LuaError::type_mismatch("nil or table", other)),
        };
        if let Some(current) = self.metatable_of(val) {
            let protected = self
                .gc
                .get_table(current)
                .raw_get_str(self.names.get(MetaMethod::Metatable));
            if !protected.is_nil() {
                return Err(LuaError::runtime("cannot change a protected metatable"));
            }
        }
        match val {
            TValue::Table(idx) => {
                let mode = self.weak_mode_of(new_mt);
                let table = self.gc.get_table_mut(idx);
                table.metatable = new_mt;
                if table.weak_mode() != mode {
                    trace!(table = ?idx, ?mode, "weak mode changed");
                    table.set_weak_mode(mode);
                }
                Ok(())
            }
            TValue::Userdata(idx) => {
                self.gc.get_userdata_mut(idx).metatable = new_mt;
                Ok(())
            }
            other => Err(LuaError::Type(format!(
                "cannot set the metatable of a {} value",
                other.type_name()
            ))),
        }
    }

    fn weak_mode_of(&self, mt: Option<GcIdx<Table>>) -> WeakMode {
        mt.map(|mt| self.gc.get_table(mt).raw_get_str(self.names.get(MetaMethod::Mode)))
            .and_then(|v| self.string_bytes(v))
            .map(WeakMode::from_mode_bytes)
            .unwrap_or(WeakMode::STRONG)
    }

    /// The shared metatable for a kind. Tables and userdata carry their own
    /// and always report `None` here.
    pub fn type_metatable(&self, ty: LuaType) -> Option<GcIdx<Table>> {
        self.type_metatables.get(ty)
    }

    /// Replace the shared metatable for a kind, returning the previous one.
    pub fn set_type_metatable(
        &mut self,
        ty: LuaType,
        mt: Option<GcIdx<Table>>,
    ) -> LuaResult<Option<GcIdx<Table>>> {
        let slot = self.type_metatables.slot_mut(ty).ok_or_else(|| {
            LuaError::Type(format!("{ty} values have per-instance metatables"))
        })?;
        let previous = std::mem::replace(slot, mt);
        trace!(kind = ty.name(), installed = mt.is_some(), "type metatable replaced");
        Ok(previous)
    }

    /// Snapshot of every shared metatable, for [`Lua::restore_type_metatables`].
    pub fn type_metatables(&self) -> TypeMetatables {
        self.type_metatables
    }

    pub fn restore_type_metatables(&mut self, saved: TypeMetatables) {
        self.type_metatables = saved;
    }

    // ---- Raw access ----

    pub(crate) fn expect_table(&self, v: TValue) -> LuaResult<GcIdx<Table>> {
        v.as_table_idx()
            .ok_or_else(|| LuaError::type_mismatch("table", v))
    }

    pub fn raw_get(&self, t: TValue, key: TValue) -> LuaResult<TValue> {
        Ok(self.gc.get_table(self.expect_table(t)?).raw_get(key))
    }

    pub fn raw_set(&mut self, t: TValue, key: TValue, value: TValue) -> LuaResult<()> {
        let idx = self.expect_table(t)?;
        self.gc.get_table_mut(idx).raw_set(key, value)
    }

    pub fn raw_geti(&self, t: TValue, i: i64) -> LuaResult<TValue> {
        Ok(self.gc.get_table(self.expect_table(t)?).raw_geti(i))
    }

    pub fn raw_seti(&mut self, t: TValue, i: i64, value: TValue) -> LuaResult<()> {
        let idx = self.expect_table(t)?;
        self.gc.get_table_mut(idx).raw_seti(i, value);
        Ok(())
    }

    /// `rawlen`: border of a table or byte length of a string.
    pub fn raw_len(&self, v: TValue) -> LuaResult<i64> {
        match v {
            TValue::Table(idx) => Ok(self.gc.get_table(idx).length()),
            TValue::String(id) => Ok(self.strings.get(id).len() as i64),
            other => Err(LuaError::type_mismatch("table or string", other)),
        }
    }

    pub fn raw_equal(&self, a: TValue, b: TValue) -> bool {
        a.raw_equals(&b)
    }

    /// `next`: traversal step over a table.
    pub fn next(&self, t: TValue, key: TValue) -> LuaResult<Option<(TValue, TValue)>> {
        self.gc.get_table(self.expect_table(t)?).next(key)
    }

    /// `ipairs` step: the entry after integer key `i`, if non-nil.
    pub fn inext(&self, t: TValue, i: i64) -> LuaResult<Option<(i64, TValue)>> {
        Ok(self.gc.get_table(self.expect_table(t)?).inext(i))
    }

    // ---- Collection ----

    /// Run a full collection. Everything reachable from `roots`, the
    /// registry and the shared metatables survives.
    pub fn collect_garbage(&mut self, roots: &[TValue]) -> GcStats {
        let mut all_roots = Vec::with_capacity(roots.len() + 8 + self.names.ids().len());
        all_roots.extend_from_slice(roots);
        all_roots.push(TValue::from_table(self.registry));
        all_roots.extend(self.type_metatables.iter().map(TValue::from_table));
        all_roots.extend(self.names.ids().iter().map(|&id| TValue::from_string_id(id)));
        self.gc.collect(&mut self.strings, &all_roots)
    }

    /// Whether a heap value still refers to a live object.
    pub fn is_live(&self, v: TValue) -> bool {
        self.gc.is_live(v, &self.strings)
    }
}

impl Default for Lua {
    fn default() -> Self {
        Self::new()
    }
}
