//! Process-stable type identity (§3 TypeInfo).
//!
//! Grounded on the teacher's `core::interner::Interner`: a name is looked up
//! once, assigned a stable index, and every further comparison/hash goes
//! through that index rather than the name bytes themselves. Here the
//! "name" being interned is a native type rather than a byte string.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

struct TypeInterner {
    ids: HashMap<TypeId, u32>,
    names: Vec<&'static str>,
}

impl TypeInterner {
    fn new() -> Self {
        Self { ids: HashMap::new(), names: Vec::new() }
    }

    fn intern(&mut self, id: TypeId, name: &'static str) -> u32 {
        if let Some(&idx) = self.ids.get(&id) {
            return idx;
        }
        let idx = self.names.len() as u32;
        self.names.push(name);
        self.ids.insert(id, idx);
        idx
    }

    fn name(&self, idx: u32) -> &'static str {
        self.names[idx as usize]
    }
}

lazy_static::lazy_static! {
    static ref INTERNER: Mutex<TypeInterner> = Mutex::new(TypeInterner::new());
}

/// Identity and displayable name for a native type.
///
/// Two `TypeInfo`s compare equal iff they denote the same native type
/// (invariant from §3); the `index` field exists purely so that hashing and
/// ordering never have to touch `TypeId`'s own (opaque) representation.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    index: u32,
}

impl TypeInfo {
    /// Returns the stable `TypeInfo` for `T`, registering it on first use.
    pub fn of<T: 'static>() -> Self {
        let id = TypeId::of::<T>();
        let index = INTERNER.lock().unwrap().intern(id, std::any::type_name::<T>());
        Self { id, index }
    }

    /// Human-readable name, as the host language's RTTI would report it.
    pub fn name(&self) -> &'static str {
        INTERNER.lock().unwrap().name(self.index)
    }

    pub(crate) fn raw_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl std::hash::Hash for TypeInfo {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
