//! Hybrid array+hash table for Lua.

use crate::error::{LuaError, LuaResult};
use crate::gc::GcIdx;
use crate::object::{Function, Thread, Userdata};
use crate::string::StringId;
use crate::value::TValue;
use indexmap::IndexMap;

/// A normalized key in the hash part of a table.
///
/// Floats with an integral value are stored as `Integer`, so `t[1]` and
/// `t[1.0]` address the same slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKey {
    Integer(i64),
    /// Non-integral float, stored as raw bits for hashing.
    Float(u64),
    Boolean(bool),
    String(StringId),
    Table(GcIdx<Table>),
    Function(GcIdx<Function>),
    Userdata(GcIdx<Userdata>),
    Thread(GcIdx<Thread>),
}

impl TableKey {
    /// Normalize a value into a key. Nil and NaN cannot be keys.
    pub fn from_value(v: TValue) -> Option<TableKey> {
        Some(match v {
            TValue::Nil => return None,
            TValue::Bool(b) => TableKey::Boolean(b),
            TValue::Int(i) => TableKey::Integer(i),
            TValue::Float(f) => {
                if f.is_nan() {
                    return None;
                }
                match crate::coerce::float_to_integer(f) {
                    Some(i) => TableKey::Integer(i),
                    None => TableKey::Float(f.to_bits()),
                }
            }
            TValue::String(id) => TableKey::String(id),
            TValue::Table(idx) => TableKey::Table(idx),
            TValue::Function(idx) => TableKey::Function(idx),
            TValue::Userdata(idx) => TableKey::Userdata(idx),
            TValue::Thread(idx) => TableKey::Thread(idx),
        })
    }

    pub fn to_value(self) -> TValue {
        match self {
            TableKey::Integer(i) => TValue::from_integer(i),
            TableKey::Float(bits) => TValue::from_float(f64::from_bits(bits)),
            TableKey::Boolean(b) => TValue::from_bool(b),
            TableKey::String(id) => TValue::from_string_id(id),
            TableKey::Table(idx) => TValue::from_table(idx),
            TableKey::Function(idx) => TValue::from_function(idx),
            TableKey::Userdata(idx) => TValue::from_userdata(idx),
            TableKey::Thread(idx) => TValue::from_thread(idx),
        }
    }
}

/// Which sides of a table's entries are weak references, as declared by the
/// metatable's `__mode` string.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WeakMode {
    pub keys: bool,
    pub values: bool,
}

impl WeakMode {
    pub const STRONG: WeakMode = WeakMode {
        keys: false,
        values: false,
    };

    /// Parse a `__mode` value: `k` makes keys weak, `v` makes values weak.
    pub fn from_mode_bytes(mode: &[u8]) -> Self {
        WeakMode {
            keys: mode.contains(&b'k'),
            values: mode.contains(&b'v'),
        }
    }

    pub fn is_weak(self) -> bool {
        self.keys || self.values
    }
}

/// Entries a collection found dead in a weak table.
#[derive(Debug, Default)]
pub struct DeadEntries {
    array_slots: Vec<usize>,
    hash_keys: Vec<TableKey>,
}

impl DeadEntries {
    pub fn is_empty(&self) -> bool {
        self.array_slots.is_empty() && self.hash_keys.is_empty()
    }
}

/// Tombstones tolerated before the hash part is compacted on insert.
const TOMBSTONE_SLACK: usize = 8;

/// A Lua table: hybrid array + hash map.
pub struct Table {
    /// Array part (1-indexed: array[0] holds key 1).
    array: Vec<TValue>,
    /// Hash part (insertion-order preserving). Keys removed while present
    /// stay behind with a nil value so `next` can still find them.
    hash: IndexMap<TableKey, TValue>,
    tombstones: usize,
    pub metatable: Option<GcIdx<Table>>,
    weak_mode: WeakMode,
}

impl Table {
    pub fn new(array_hint: usize, hash_hint: usize) -> Self {
        Table {
            array: Vec::with_capacity(array_hint),
            hash: IndexMap::with_capacity(hash_hint),
            tombstones: 0,
            metatable: None,
            weak_mode: WeakMode::STRONG,
        }
    }

    pub fn weak_mode(&self) -> WeakMode {
        self.weak_mode
    }

    pub(crate) fn set_weak_mode(&mut self, mode: WeakMode) {
        self.weak_mode = mode;
    }

    /// Raw get by TValue key. Missing keys (and nil/NaN) read as nil.
    pub fn raw_get(&self, key: TValue) -> TValue {
        match TableKey::from_value(key) {
            Some(TableKey::Integer(i)) => self.raw_geti(i),
            Some(tk) => self.hash.get(&tk).copied().unwrap_or_default(),
            None => TValue::nil(),
        }
    }

    /// Raw set by TValue key. Assigning nil removes the entry.
    pub fn raw_set(&mut self, key: TValue, value: TValue) -> LuaResult<()> {
        match TableKey::from_value(key) {
            Some(TableKey::Integer(i)) => {
                self.raw_seti(i, value);
                Ok(())
            }
            Some(tk) => {
                self.hash_set(tk, value);
                Ok(())
            }
            None if key.is_nil() => Err(LuaError::runtime("table index is nil")),
            None => Err(LuaError::runtime("table index is NaN")),
        }
    }

    /// Fast integer get (1-indexed).
    pub fn raw_geti(&self, key: i64) -> TValue {
        if key >= 1 && (key as u64) <= self.array.len() as u64 {
            self.array[(key - 1) as usize]
        } else {
            self.hash
                .get(&TableKey::Integer(key))
                .copied()
                .unwrap_or_default()
        }
    }

    /// Fast integer set (1-indexed).
    pub fn raw_seti(&mut self, key: i64, value: TValue) {
        if key >= 1 {
            let idx = (key - 1) as u64;
            let len = self.array.len() as u64;
            if idx < len {
                self.array[idx as usize] = value;
                if value.is_nil() && idx + 1 == len {
                    self.trim_array();
                }
                return;
            }
            if idx == len && !value.is_nil() {
                // The key may already live in the hash part.
                if self.hash.contains_key(&TableKey::Integer(key)) {
                    self.hash_set(TableKey::Integer(key), TValue::nil());
                }
                self.array.push(value);
                self.migrate_hash_to_array();
                return;
            }
        }
        self.hash_set(TableKey::Integer(key), value);
    }

    /// Fast string key get.
    pub fn raw_get_str(&self, key: StringId) -> TValue {
        self.hash
            .get(&TableKey::String(key))
            .copied()
            .unwrap_or_default()
    }

    /// Fast string key set.
    pub fn raw_set_str(&mut self, key: StringId, value: TValue) {
        self.hash_set(TableKey::String(key), value);
    }

    fn hash_set(&mut self, key: TableKey, value: TValue) {
        match self.hash.get_mut(&key) {
            Some(slot) => {
                match (slot.is_nil(), value.is_nil()) {
                    (false, true) => self.tombstones += 1,
                    (true, false) => self.tombstones -= 1,
                    _ => {}
                }
                *slot = value;
            }
            None if value.is_nil() => {}
            None => {
                if self.tombstones > TOMBSTONE_SLACK && self.tombstones * 2 > self.hash.len() {
                    self.compact_hash();
                }
                self.hash.insert(key, value);
            }
        }
    }

    /// The border: some `n` with `t[n] ~= nil` and `t[n+1] == nil`
    /// (or 0 when `t[1]` is nil).
    pub fn length(&self) -> i64 {
        match self.array.last() {
            None => self.hash_border(0),
            Some(last) if !last.is_nil() => self.hash_border(self.array.len() as i64),
            Some(_) => {
                // Binary search for a border inside the array part.
                let mut lo = 0usize;
                let mut hi = self.array.len();
                while lo < hi {
                    let mid = (lo + hi) / 2;
                    if self.array[mid].is_nil() {
                        hi = mid;
                    } else {
                        lo = mid + 1;
                    }
                }
                lo as i64
            }
        }
    }

    /// Continue a border search into the hash part from `n`.
    fn hash_border(&self, mut n: i64) -> i64 {
        while n < i64::MAX
            && self
                .hash
                .get(&TableKey::Integer(n + 1))
                .is_some_and(|v| !v.is_nil())
        {
            n += 1;
        }
        n
    }

    /// Next key/value after `key` in traversal order: array part ascending,
    /// then the hash part in insertion order. Nil starts the traversal.
    ///
    /// Keys that were removed during the traversal remain valid arguments.
    pub fn next(&self, key: TValue) -> LuaResult<Option<(TValue, TValue)>> {
        let start_hash = match TableKey::from_value(key) {
            None if key.is_nil() => return Ok(self.next_from_array(0)),
            None => return Err(invalid_next_key()),
            Some(TableKey::Integer(i)) if i >= 1 && (i as u64) <= self.array.len() as u64 => {
                return Ok(self.next_from_array(i as usize));
            }
            Some(tk) => match self.hash.get_index_of(&tk) {
                Some(pos) => pos + 1,
                // An integer key that fell off the end of a shrunken array.
                None if matches!(tk, TableKey::Integer(i) if i >= 1) => 0,
                None => return Err(invalid_next_key()),
            },
        };
        Ok(self.next_from_hash(start_hash))
    }

    fn next_from_array(&self, from: usize) -> Option<(TValue, TValue)> {
        for (j, v) in self.array.iter().enumerate().skip(from) {
            if !v.is_nil() {
                return Some((TValue::from_integer(j as i64 + 1), *v));
            }
        }
        self.next_from_hash(0)
    }

    fn next_from_hash(&self, from: usize) -> Option<(TValue, TValue)> {
        (from..self.hash.len()).find_map(|pos| {
            let (k, v) = self.hash.get_index(pos)?;
            (!v.is_nil()).then(|| (k.to_value(), *v))
        })
    }

    /// Integer-key traversal: the entry at `i + 1`, stopping at the first nil.
    pub fn inext(&self, i: i64) -> Option<(i64, TValue)> {
        let k = i.checked_add(1)?;
        let v = self.raw_geti(k);
        (!v.is_nil()).then_some((k, v))
    }

    /// Every live entry, array part first.
    pub fn iter(&self) -> impl Iterator<Item = (TValue, TValue)> + '_ {
        let array = self
            .array
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.is_nil())
            .map(|(i, v)| (TValue::from_integer(i as i64 + 1), *v));
        let hash = self
            .hash
            .iter()
            .filter(|(_, v)| !v.is_nil())
            .map(|(k, v)| (k.to_value(), *v));
        array.chain(hash)
    }

    pub fn array_len(&self) -> usize {
        self.array.len()
    }

    /// Live entries in the hash part (tombstones excluded).
    pub fn hash_len(&self) -> usize {
        self.hash.len() - self.tombstones
    }

    /// Drop tombstones from the hash part.
    pub fn compact_hash(&mut self) {
        self.hash.retain(|_, v| !v.is_nil());
        self.tombstones = 0;
    }

    /// Move consecutive integer entries from hash into array.
    fn migrate_hash_to_array(&mut self) {
        loop {
            let next_key = TableKey::Integer(self.array.len() as i64 + 1);
            match self.hash.get(&next_key) {
                Some(v) if !v.is_nil() => {
                    let v = *v;
                    self.hash.shift_remove(&next_key);
                    self.array.push(v);
                }
                _ => break,
            }
        }
    }

    fn trim_array(&mut self) {
        while self.array.last().is_some_and(|v| v.is_nil()) {
            self.array.pop();
        }
    }

    /// Find entries whose weak side refers to a dead object.
    pub fn dead_weak_entries(&self, mode: WeakMode, is_dead: impl Fn(TValue) -> bool) -> DeadEntries {
        let mut dead = DeadEntries::default();
        if mode.values {
            for (i, v) in self.array.iter().enumerate() {
                if is_dead(*v) {
                    dead.array_slots.push(i);
                }
            }
        }
        for (k, v) in &self.hash {
            if v.is_nil() {
                continue;
            }
            let key_dead = mode.keys && is_dead(k.to_value());
            let value_dead = mode.values && is_dead(*v);
            if key_dead || value_dead {
                dead.hash_keys.push(*k);
            }
        }
        dead
    }

    /// Remove entries found by [`Table::dead_weak_entries`]. Returns how
    /// many were removed.
    pub fn remove_weak_entries(&mut self, dead: DeadEntries) -> usize {
        let removed = dead.array_slots.len() + dead.hash_keys.len();
        for i in dead.array_slots {
            self.array[i] = TValue::nil();
        }
        self.trim_array();
        // Leave tombstones so a traversal in progress can continue past them.
        for k in dead.hash_keys {
            self.hash_set(k, TValue::nil());
        }
        removed
    }
}

fn invalid_next_key() -> LuaError {
    LuaError::runtime("invalid key to 'next'")
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "table(array={}, hash={})",
            self.array.len(),
            self.hash_len()
        )
    }
}
