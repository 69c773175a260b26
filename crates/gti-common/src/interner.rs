//! Name interning for class, type parameter and method names.
//!
//! Every name that appears in a declared class table is interned once and
//! passed around as an [`Atom`]. Equality of names is then an integer compare,
//! and the type interner can hash `TypeData` values that mention names without
//! touching string data.

use rustc_hash::{FxHashMap, FxHasher};
use serde::Serialize;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, RwLock};

/// An interned name.
///
/// Atoms are `Copy` and compare in O(1). Use [`NameTable::resolve`] to get the
/// text back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// The empty name.
    pub const NONE: Atom = Atom(0);

    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

const SHARD_BITS: u32 = 4;
const SHARD_COUNT: usize = 1 << SHARD_BITS;
const SHARD_MASK: u32 = (SHARD_COUNT as u32) - 1;

/// Names every host world declares. Pre-interning them keeps the atoms of the
/// well-known classes small and stable across runs.
const WELL_KNOWN_NAMES: &[&str] = &[
    "Object",
    "Throwable",
    "Exception",
    "RuntimeException",
    "Error",
    "Number",
    "String",
    "Boolean",
    "Byte",
    "Short",
    "Character",
    "Integer",
    "Long",
    "Float",
    "Double",
    "Comparable",
    "Iterable",
    "Collection",
    "List",
    "ArrayList",
    "Function",
    "Supplier",
    "Consumer",
    "T",
    "U",
    "R",
    "E",
    "K",
    "V",
    "apply",
    "get",
    "accept",
];

#[derive(Default)]
struct ShardState {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

struct NameShard {
    state: RwLock<ShardState>,
}

impl NameShard {
    fn new() -> Self {
        NameShard {
            state: RwLock::new(ShardState::default()),
        }
    }
}

/// Concurrent name table.
///
/// Names are spread over fixed shards so independent inference sessions that
/// declare fresh capture or type-parameter names rarely contend on one lock.
pub struct NameTable {
    shards: [NameShard; SHARD_COUNT],
}

impl NameTable {
    pub fn new() -> Self {
        let shards = std::array::from_fn(|_| NameShard::new());
        if let Ok(mut state) = shards[0].state.write() {
            let empty: Arc<str> = Arc::from("");
            state.strings.push(empty.clone());
            state.map.insert(empty, Atom::NONE);
        }
        let table = NameTable { shards };
        for name in WELL_KNOWN_NAMES {
            table.intern(name);
        }
        table
    }

    /// Intern a name, returning the existing atom when it was seen before.
    pub fn intern(&self, s: &str) -> Atom {
        if s.is_empty() {
            return Atom::NONE;
        }

        let shard_idx = Self::shard_for(s);
        let Ok(mut state) = self.shards[shard_idx].state.write() else {
            return Atom::NONE;
        };

        if let Some(&atom) = state.map.get(s) {
            return atom;
        }

        let local_index = state.strings.len() as u32;
        if local_index > (u32::MAX >> SHARD_BITS) {
            return Atom::NONE;
        }

        let atom = Atom((local_index << SHARD_BITS) | (shard_idx as u32 & SHARD_MASK));
        let owned: Arc<str> = Arc::from(s);
        state.strings.push(owned.clone());
        state.map.insert(owned, atom);
        atom
    }

    /// Look a name up without interning it.
    pub fn lookup(&self, s: &str) -> Option<Atom> {
        if s.is_empty() {
            return Some(Atom::NONE);
        }
        let state = self.shards[Self::shard_for(s)].state.read().ok()?;
        state.map.get(s).copied()
    }

    /// Resolve an atom to its text. Unknown atoms resolve to the empty string.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.try_resolve(atom).unwrap_or_else(|| Arc::from(""))
    }

    pub fn try_resolve(&self, atom: Atom) -> Option<Arc<str>> {
        let (shard_idx, local_index) = if atom == Atom::NONE {
            (0, 0)
        } else {
            (
                (atom.0 & SHARD_MASK) as usize,
                (atom.0 >> SHARD_BITS) as usize,
            )
        };
        let state = self.shards.get(shard_idx)?.state.read().ok()?;
        state.strings.get(local_index).cloned()
    }

    /// Number of distinct names, counting the empty name.
    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.state.read().map(|s| s.strings.len()).unwrap_or(0))
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    #[inline]
    fn shard_for(s: &str) -> usize {
        let mut hasher = FxHasher::default();
        s.hash(&mut hasher);
        (hasher.finish() as usize) & (SHARD_COUNT - 1)
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../tests/interner_tests.rs"]
mod tests;
