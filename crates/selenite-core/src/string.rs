/// Interned Lua byte strings.
///
/// Every string is interned regardless of length, so two `StringId`s are
/// equal exactly when their contents are. Strings are garbage collected:
/// the interner is an [`Arena`] and a sweep drops unmarked strings from the
/// lookup table as well.
use crate::gc::{Arena, GcIdx};
use std::collections::HashMap;
use std::fmt;

/// Bytes stored inline before spilling to the heap.
const INLINE_MAX: usize = 40;

/// Handle to an interned string.
pub type StringId = GcIdx<TString>;

#[derive(Clone)]
enum StringData {
    Inline { buf: [u8; INLINE_MAX], len: u8 },
    Heap(Box<[u8]>),
}

/// An immutable byte string with its precomputed hash.
#[derive(Clone)]
pub struct TString {
    data: StringData,
    hash: u32,
}

impl TString {
    fn new(bytes: &[u8], hash: u32) -> Self {
        let data = if bytes.len() <= INLINE_MAX {
            let mut buf = [0u8; INLINE_MAX];
            buf[..bytes.len()].copy_from_slice(bytes);
            StringData::Inline {
                buf,
                len: bytes.len() as u8,
            }
        } else {
            StringData::Heap(bytes.into())
        };
        TString { data, hash }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match &self.data {
            StringData::Inline { buf, len } => &buf[..*len as usize],
            StringData::Heap(v) => v,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }
}

impl fmt::Debug for TString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.as_bytes()) {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "<binary string len={}>", self.len()),
        }
    }
}

/// PUC Lua 5.4 compatible string hash (`luaS_hash` with seed = length).
pub fn lua_hash(bytes: &[u8]) -> u32 {
    let len = bytes.len();
    let mut h = len as u32;
    let step = (len >> 5) + 1;
    let mut i = len;
    while i >= step {
        h ^= (h << 5).wrapping_add(h >> 2).wrapping_add(bytes[i - 1] as u32);
        i -= step;
    }
    h
}

/// Owns every string and deduplicates by content.
pub struct StringInterner {
    arena: Arena<TString>,
    lookup: HashMap<u32, Vec<StringId>>,
}

impl StringInterner {
    pub fn new() -> Self {
        StringInterner {
            arena: Arena::new(),
            lookup: HashMap::new(),
        }
    }

    /// Intern `bytes`, returning the existing id when the content is known.
    pub fn intern(&mut self, bytes: &[u8]) -> StringId {
        let hash = lua_hash(bytes);
        if let Some(id) = self.find_hashed(bytes, hash) {
            return id;
        }
        let id = self.arena.alloc(TString::new(bytes, hash));
        self.lookup.entry(hash).or_default().push(id);
        id
    }

    pub fn intern_str(&mut self, s: &str) -> StringId {
        self.intern(s.as_bytes())
    }

    /// Look up already-interned content without creating it.
    pub fn find(&self, bytes: &[u8]) -> Option<StringId> {
        self.find_hashed(bytes, lua_hash(bytes))
    }

    fn find_hashed(&self, bytes: &[u8], hash: u32) -> Option<StringId> {
        self.lookup.get(&hash).and_then(|ids| {
            ids.iter()
                .copied()
                .find(|&id| self.get(id).as_bytes() == bytes)
        })
    }

    pub fn get(&self, id: StringId) -> &TString {
        self.arena.get(id).expect("string was freed")
    }

    pub fn get_bytes(&self, id: StringId) -> &[u8] {
        self.get(id).as_bytes()
    }

    pub fn contains(&self, id: StringId) -> bool {
        self.arena.contains(id)
    }

    /// Number of live strings.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub(crate) fn mark(&mut self, id: StringId) -> bool {
        self.arena.mark(id)
    }

    pub(crate) fn is_marked(&self, id: StringId) -> bool {
        self.arena.is_marked(id)
    }

    pub(crate) fn clear_marks(&mut self) {
        self.arena.clear_marks();
    }

    /// Free unmarked strings and forget them in the lookup table.
    pub(crate) fn sweep(&mut self) -> usize {
        let lookup = &mut self.lookup;
        self.arena.sweep_with(|id, s| {
            if let Some(ids) = lookup.get_mut(&s.hash()) {
                ids.retain(|&other| other != id);
                if ids.is_empty() {
                    lookup.remove(&s.hash());
                }
            }
        })
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StringInterner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StringInterner")
            .field("live", &self.len())
            .finish()
    }
}
