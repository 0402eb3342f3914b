//! GC heap with arena-based allocation, generational typed indices and a
//! stop-the-world mark/sweep collector that understands weak tables.

use crate::object::{Function, Thread, ThreadStatus, Userdata};
use crate::string::StringInterner;
use crate::table::{Table, WeakMode};
use crate::value::TValue;
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// A typed handle into an [`Arena`].
///
/// The generation is bumped whenever a slot is freed, so a handle that
/// outlives its object never aliases whatever is allocated in its place.
pub struct GcIdx<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> GcIdx<T> {
    fn new(index: u32, generation: u32) -> Self {
        GcIdx {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl<T> Clone for GcIdx<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for GcIdx<T> {}

impl<T> PartialEq for GcIdx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}
impl<T> Eq for GcIdx<T> {}

impl<T> std::hash::Hash for GcIdx<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for GcIdx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}

struct Slot<T> {
    generation: u32,
    marked: bool,
    value: Option<T>,
}

/// Slot storage for one object kind, with a free list.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn alloc(&mut self, value: T) -> GcIdx<T> {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            slot.marked = false;
            GcIdx::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                marked: false,
                value: Some(value),
            });
            GcIdx::new(index, 0)
        }
    }

    fn slot(&self, idx: GcIdx<T>) -> Option<&Slot<T>> {
        self.slots
            .get(idx.index as usize)
            .filter(|s| s.generation == idx.generation && s.value.is_some())
    }

    fn slot_mut(&mut self, idx: GcIdx<T>) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(idx.index as usize)
            .filter(|s| s.generation == idx.generation && s.value.is_some())
    }

    pub fn get(&self, idx: GcIdx<T>) -> Option<&T> {
        self.slot(idx).and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, idx: GcIdx<T>) -> Option<&mut T> {
        self.slot_mut(idx).and_then(|s| s.value.as_mut())
    }

    pub fn contains(&self, idx: GcIdx<T>) -> bool {
        self.slot(idx).is_some()
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Mark `idx`. Returns true only the first time a live object is marked.
    pub fn mark(&mut self, idx: GcIdx<T>) -> bool {
        match self.slot_mut(idx) {
            Some(slot) if !slot.marked => {
                slot.marked = true;
                true
            }
            _ => false,
        }
    }

    pub fn is_marked(&self, idx: GcIdx<T>) -> bool {
        self.slot(idx).is_some_and(|s| s.marked)
    }

    pub fn clear_marks(&mut self) {
        for slot in &mut self.slots {
            slot.marked = false;
        }
    }

    /// Handles of every live object.
    pub fn handles(&self) -> Vec<GcIdx<T>> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.value.is_some())
            .map(|(i, s)| GcIdx::new(i as u32, s.generation))
            .collect()
    }

    /// Free every unmarked object, calling `on_free` for each before it is
    /// dropped. Returns the number freed.
    pub fn sweep_with(&mut self, mut on_free: impl FnMut(GcIdx<T>, &T)) -> usize {
        let mut freed = 0;
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.marked {
                continue;
            }
            if let Some(value) = slot.value.take() {
                on_free(GcIdx::new(i as u32, slot.generation), &value);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(i as u32);
                freed += 1;
            }
        }
        self.live -= freed;
        freed
    }

    pub fn sweep(&mut self) -> usize {
        self.sweep_with(|_, _| {})
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The GC heap: one arena per collectable object kind (strings live in the
/// [`StringInterner`]).
pub struct GcHeap {
    pub tables: Arena<Table>,
    pub functions: Arena<Function>,
    pub userdata: Arena<Userdata>,
    pub threads: Arena<Thread>,
}

impl GcHeap {
    pub fn new() -> Self {
        GcHeap {
            tables: Arena::new(),
            functions: Arena::new(),
            userdata: Arena::new(),
            threads: Arena::new(),
        }
    }

    pub fn alloc_table(&mut self, array_hint: usize, hash_hint: usize) -> GcIdx<Table> {
        self.tables.alloc(Table::new(array_hint, hash_hint))
    }

    pub fn get_table(&self, idx: GcIdx<Table>) -> &Table {
        self.tables.get(idx).expect("table was freed")
    }

    pub fn get_table_mut(&mut self, idx: GcIdx<Table>) -> &mut Table {
        self.tables.get_mut(idx).expect("table was freed")
    }

    pub fn alloc_function(&mut self, function: Function) -> GcIdx<Function> {
        self.functions.alloc(function)
    }

    pub fn get_function(&self, idx: GcIdx<Function>) -> &Function {
        self.functions.get(idx).expect("function was freed")
    }

    pub fn alloc_userdata(&mut self, data: Box<dyn Any>) -> GcIdx<Userdata> {
        self.userdata.alloc(Userdata::new(data))
    }

    pub fn get_userdata(&self, idx: GcIdx<Userdata>) -> &Userdata {
        self.userdata.get(idx).expect("userdata was freed")
    }

    pub fn get_userdata_mut(&mut self, idx: GcIdx<Userdata>) -> &mut Userdata {
        self.userdata.get_mut(idx).expect("userdata was freed")
    }

    pub fn alloc_thread(&mut self, body: TValue) -> GcIdx<Thread> {
        self.threads.alloc(Thread {
            body,
            status: ThreadStatus::Suspended,
        })
    }

    pub fn get_thread(&self, idx: GcIdx<Thread>) -> &Thread {
        self.threads.get(idx).expect("thread was freed")
    }

    pub fn get_thread_mut(&mut self, idx: GcIdx<Thread>) -> &mut Thread {
        self.threads.get_mut(idx).expect("thread was freed")
    }

    /// Whether a heap-backed value still refers to a live object.
    pub fn is_live(&self, val: TValue, strings: &StringInterner) -> bool {
        match val {
            TValue::String(id) => strings.contains(id),
            TValue::Table(idx) => self.tables.contains(idx),
            TValue::Function(idx) => self.functions.contains(idx),
            TValue::Userdata(idx) => self.userdata.contains(idx),
            TValue::Thread(idx) => self.threads.contains(idx),
            _ => true,
        }
    }

    /// Run a full collection cycle.
    ///
    /// Everything reachable from `roots` survives. Entries of weak tables
    /// whose weak side refers to an unreachable object are removed before the
    /// sweep; tables with weak keys are treated as ephemerons, so a value is
    /// only kept alive through its key.
    pub fn collect(&mut self, strings: &mut StringInterner, roots: &[TValue]) -> GcStats {
        self.tables.clear_marks();
        self.functions.clear_marks();
        self.userdata.clear_marks();
        self.threads.clear_marks();
        strings.clear_marks();

        self.refresh_weak_modes(strings);

        let mut marker = Marker {
            gray: roots.to_vec(),
            ephemerons: Vec::new(),
            weak: Vec::new(),
        };
        marker.propagate(self, strings);

        // Ephemeron fixpoint: a weak-keyed entry's value becomes reachable
        // once its key is marked by someone else.
        loop {
            for &idx in &marker.ephemerons {
                let table = self.get_table(idx);
                let weak_values = table.weak_mode().values;
                for (key, value) in table.iter() {
                    if self.is_dead(key) || self.is_marked(value, strings) {
                        continue;
                    }
                    if !weak_values || !value.is_collectable() {
                        marker.gray.push(value);
                    }
                }
            }
            if marker.gray.is_empty() {
                break;
            }
            marker.propagate(self, strings);
        }

        let mut cleared = 0;
        for &idx in &marker.weak {
            let mode = self.get_table(idx).weak_mode();
            let dead = self
                .get_table(idx)
                .dead_weak_entries(mode, |v| self.is_dead(v));
            cleared += self.get_table_mut(idx).remove_weak_entries(dead);
        }

        let stats = GcStats {
            tables_freed: self.tables.sweep(),
            functions_freed: self.functions.sweep(),
            userdata_freed: self.userdata.sweep(),
            threads_freed: self.threads.sweep(),
            strings_freed: strings.sweep(),
            weak_entries_cleared: cleared,
        };
        debug!(
            tables = stats.tables_freed,
            functions = stats.functions_freed,
            userdata = stats.userdata_freed,
            threads = stats.threads_freed,
            strings = stats.strings_freed,
            weak_cleared = stats.weak_entries_cleared,
            "gc cycle finished"
        );
        stats
    }

    /// Re-read `__mode` from every table's metatable.
    fn refresh_weak_modes(&mut self, strings: &StringInterner) {
        let Some(mode_key) = strings.find(b"__mode") else {
            for idx in self.tables.handles() {
                self.get_table_mut(idx).set_weak_mode(WeakMode::STRONG);
            }
            return;
        };
        for idx in self.tables.handles() {
            let mode = self
                .get_table(idx)
                .metatable
                .and_then(|mt| self.tables.get(mt))
                .map(|mt| mt.raw_get_str(mode_key))
                .and_then(|v| v.as_string_id())
                .map(|id| WeakMode::from_mode_bytes(strings.get_bytes(id)))
                .unwrap_or(WeakMode::STRONG);
            let table = self.get_table_mut(idx);
            if table.weak_mode() != mode {
                trace!(table = ?idx, ?mode, "weak mode changed");
                table.set_weak_mode(mode);
            }
        }
    }

    fn is_marked(&self, val: TValue, strings: &StringInterner) -> bool {
        match val {
            TValue::String(id) => strings.is_marked(id),
            TValue::Table(idx) => self.tables.is_marked(idx),
            TValue::Function(idx) => self.functions.is_marked(idx),
            TValue::Userdata(idx) => self.userdata.is_marked(idx),
            TValue::Thread(idx) => self.threads.is_marked(idx),
            _ => true,
        }
    }

    /// A collectable value that marking did not reach.
    fn is_dead(&self, val: TValue) -> bool {
        match val {
            TValue::Table(idx) => !self.tables.is_marked(idx),
            TValue::Function(idx) => !self.functions.is_marked(idx),
            TValue::Userdata(idx) => !self.userdata.is_marked(idx),
            TValue::Thread(idx) => !self.threads.is_marked(idx),
            _ => false,
        }
    }
}

impl Default for GcHeap {
    fn default() -> Self {
        Self::new()
    }
}

struct Marker {
    gray: Vec<TValue>,
    ephemerons: Vec<GcIdx<Table>>,
    weak: Vec<GcIdx<Table>>,
}

impl Marker {
    fn propagate(&mut self, heap: &mut GcHeap, strings: &mut StringInterner) {
        while let Some(val) = self.gray.pop() {
            match val {
                TValue::String(id) => {
                    strings.mark(id);
                }
                TValue::Table(idx) => {
                    if heap.tables.mark(idx) {
                        self.traverse_table(heap, idx);
                    }
                }
                TValue::Function(idx) => {
                    if heap.functions.mark(idx) {
                        heap.get_function(idx).body.trace(&mut self.gray);
                    }
                }
                TValue::Userdata(idx) => {
                    if heap.userdata.mark(idx) {
                        let ud = heap.get_userdata(idx);
                        if let Some(mt) = ud.metatable {
                            self.gray.push(TValue::from_table(mt));
                        }
                        self.gray.push(ud.user_value);
                    }
                }
                TValue::Thread(idx) => {
                    if heap.threads.mark(idx) {
                        self.gray.push(heap.get_thread(idx).body);
                    }
                }
                _ => {}
            }
        }
    }

    fn traverse_table(&mut self, heap: &GcHeap, idx: GcIdx<Table>) {
        let table = heap.get_table(idx);
        if let Some(mt) = table.metatable {
            self.gray.push(TValue::from_table(mt));
        }
        let mode = table.weak_mode();
        if mode.is_weak() {
            self.weak.push(idx);
        }
        if mode.keys {
            self.ephemerons.push(idx);
        }
        for (key, value) in table.iter() {
            if !mode.keys || !key.is_collectable() {
                self.gray.push(key);
            }
            // Weak-keyed values wait for the ephemeron pass unless the key
            // can never die.
            let key_keeps_value = !mode.keys || !key.is_collectable();
            if (!mode.values || !value.is_collectable()) && key_keeps_value {
                self.gray.push(value);
            }
        }
    }
}

/// What a collection cycle reclaimed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GcStats {
    pub tables_freed: usize,
    pub functions_freed: usize,
    pub userdata_freed: usize,
    pub threads_freed: usize,
    pub strings_freed: usize,
    pub weak_entries_cleared: usize,
}

impl GcStats {
    pub fn objects_freed(&self) -> usize {
        self.tables_freed
            + self.functions_freed
            + self.userdata_freed
            + self.threads_freed
            + self.strings_freed
    }
}
