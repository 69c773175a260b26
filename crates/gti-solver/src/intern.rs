//! Type interning for structural deduplication.
//!
//! This module implements the interning table that converts `TypeData`
//! values into lightweight `TypeId` handles, plus the declaration tables for
//! classes, type parameters, methods, capture variables and inference
//! variables.
//!
//! Benefits:
//! - O(1) type equality (just compare `TypeId` values)
//! - Each unique structure stored once
//! - Declarations can be completed after creation (F-bounds, cyclic
//!   supertypes) without re-interning the types that mention them

use crate::db::TypeDatabase;
use crate::types::*;
use gti_common::{Atom, NameTable};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

const TYPE_LIST_INLINE: usize = 4;

type TypeListBuffer = SmallVec<[TypeId; TYPE_LIST_INLINE]>;

struct SliceInterner<T> {
    items: Vec<Arc<[T]>>,
    map: FxHashMap<Arc<[T]>, u32>,
}

impl<T> SliceInterner<T>
where
    T: Eq + Hash + Clone,
{
    fn new() -> Self {
        let empty: Arc<[T]> = Arc::from(Vec::new());
        let mut map = FxHashMap::default();
        map.insert(empty.clone(), 0);
        SliceInterner {
            items: vec![empty],
            map,
        }
    }

    fn intern(&mut self, items: &[T]) -> u32 {
        if items.is_empty() {
            return 0;
        }
        if let Some(&id) = self.map.get(items) {
            return id;
        }
        let arc: Arc<[T]> = Arc::from(items.to_vec());
        let id = self.items.len() as u32;
        self.items.push(arc.clone());
        self.map.insert(arc, id);
        id
    }

    fn get(&self, id: u32) -> Option<Arc<[T]>> {
        self.items.get(id as usize).cloned()
    }

    fn empty(&self) -> Arc<[T]> {
        self.items[0].clone()
    }
}

#[derive(Default)]
struct TypeStore {
    index_to_data: Vec<TypeData>,
    data_to_index: FxHashMap<TypeData, u32>,
}

/// Type interning table and declaration store.
/// Thread-safe via `RwLock` for concurrent access.
pub struct TypeInterner {
    names: NameTable,
    types: RwLock<TypeStore>,
    type_lists: RwLock<SliceInterner<TypeId>>,
    classes: RwLock<Vec<Arc<ClassDecl>>>,
    classes_by_name: RwLock<FxHashMap<Atom, ClassId>>,
    type_params: RwLock<Vec<Arc<TypeParamDecl>>>,
    methods: RwLock<Vec<Arc<MethodSig>>>,
    captures: RwLock<Vec<CaptureInfo>>,
    inference_vars: RwLock<Vec<Option<TypeParamId>>>,
}

impl TypeInterner {
    /// Create an interner with the intrinsics and well-known classes
    /// registered at their fixed ids.
    pub fn new() -> Self {
        let interner = TypeInterner {
            names: NameTable::new(),
            types: RwLock::new(TypeStore::default()),
            type_lists: RwLock::new(SliceInterner::new()),
            classes: RwLock::new(Vec::new()),
            classes_by_name: RwLock::new(FxHashMap::default()),
            type_params: RwLock::new(Vec::new()),
            methods: RwLock::new(Vec::new()),
            captures: RwLock::new(Vec::new()),
            inference_vars: RwLock::new(Vec::new()),
        };
        interner.intern(TypeData::Error);
        interner.intern(TypeData::Null);
        interner.intern(TypeData::Intrinsic(IntrinsicKind::Void));
        for kind in IntrinsicKind::PRIMITIVES {
            interner.intern(TypeData::Intrinsic(kind));
        }
        interner.register_well_known();
        interner
    }

    fn register_well_known(&self) {
        use ClassKind::Class;
        // (name, direct superclass); order fixes ClassId and TypeId values.
        let table: [(&str, Option<TypeId>); 15] = [
            ("Object", None),
            ("Throwable", Some(TypeId::OBJECT)),
            ("Exception", Some(TypeId::THROWABLE)),
            ("RuntimeException", Some(TypeId::EXCEPTION)),
            ("Error", Some(TypeId::THROWABLE)),
            ("Number", Some(TypeId::OBJECT)),
            ("String", Some(TypeId::OBJECT)),
            ("Boolean", Some(TypeId::OBJECT)),
            ("Byte", Some(TypeId::NUMBER)),
            ("Short", Some(TypeId::NUMBER)),
            ("Character", Some(TypeId::OBJECT)),
            ("Integer", Some(TypeId::NUMBER)),
            ("Long", Some(TypeId::NUMBER)),
            ("Float", Some(TypeId::NUMBER)),
            ("Double", Some(TypeId::NUMBER)),
        ];
        for (name, superclass) in table {
            let decl = self.declare_class(name, Class, &[]);
            self.class_type(decl, Vec::new());
            if let Some(sup) = superclass {
                self.set_supertypes(decl, vec![sup]);
            }
        }
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    /// Declare a class or interface with fresh type parameters.
    ///
    /// Parameters start unbounded; use [`set_type_param_bounds`] to add
    /// (possibly F-bounded) bounds once the class id exists.
    ///
    /// [`set_type_param_bounds`]: TypeInterner::set_type_param_bounds
    pub fn declare_class(&self, name: &str, kind: ClassKind, type_params: &[&str]) -> ClassId {
        let atom = self.names.intern(name);
        let params = type_params
            .iter()
            .map(|p| self.declare_type_param(p))
            .collect();
        let decl = ClassDecl {
            name: atom,
            kind,
            type_params: params,
            supertypes: Vec::new(),
            functional: None,
        };
        let mut classes = self.classes.write().expect("classes lock poisoned");
        let id = ClassId(classes.len() as u32);
        classes.push(Arc::new(decl));
        self.classes_by_name
            .write()
            .expect("classes_by_name lock poisoned")
            .insert(atom, id);
        id
    }

    pub fn set_supertypes(&self, class: ClassId, supertypes: Vec<TypeId>) {
        self.update_class(class, |decl| decl.supertypes = supertypes);
    }

    pub fn set_functional_method(&self, class: ClassId, method: FunctionalMethod) {
        self.update_class(class, |decl| decl.functional = Some(method));
    }

    fn update_class(&self, class: ClassId, f: impl FnOnce(&mut ClassDecl)) {
        let mut classes = self.classes.write().expect("classes lock poisoned");
        if let Some(slot) = classes.get_mut(class.0 as usize) {
            let mut decl = (**slot).clone();
            f(&mut decl);
            *slot = Arc::new(decl);
        }
    }

    pub fn class_by_name(&self, name: &str) -> Option<ClassId> {
        let atom = self.names.lookup(name)?;
        self.classes_by_name
            .read()
            .expect("classes_by_name lock poisoned")
            .get(&atom)
            .copied()
    }

    /// Type-parameter types of a class, in declaration order.
    pub fn class_type_params(&self, class: ClassId) -> Vec<TypeId> {
        self.class_decl(class)
            .map(|d| d.type_params.iter().map(|&p| self.type_param(p)).collect())
            .unwrap_or_default()
    }

    pub fn declare_type_param(&self, name: &str) -> TypeParamId {
        let decl = TypeParamDecl {
            name: self.names.intern(name),
            bounds: Vec::new(),
        };
        let mut params = self.type_params.write().expect("type_params lock poisoned");
        let id = TypeParamId(params.len() as u32);
        params.push(Arc::new(decl));
        id
    }

    pub fn set_type_param_bounds(&self, param: TypeParamId, bounds: Vec<TypeId>) {
        let mut params = self.type_params.write().expect("type_params lock poisoned");
        if let Some(slot) = params.get_mut(param.0 as usize) {
            *slot = Arc::new(TypeParamDecl {
                name: slot.name,
                bounds,
            });
        }
    }

    pub fn declare_method(&self, sig: MethodSig) -> MethodId {
        let mut methods = self.methods.write().expect("methods lock poisoned");
        let id = MethodId(methods.len() as u32);
        methods.push(Arc::new(sig));
        id
    }

    /// Number of interned types, including the reserved ones.
    pub fn len(&self) -> usize {
        self.types
            .read()
            .expect("types lock poisoned")
            .index_to_data
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeDatabase for TypeInterner {
    fn intern(&self, data: TypeData) -> TypeId {
        if let Some(&index) = self
            .types
            .read()
            .expect("types lock poisoned")
            .data_to_index
            .get(&data)
        {
            return TypeId(index);
        }
        let mut store = self.types.write().expect("types lock poisoned");
        // Another writer may have won the race between the two locks.
        if let Some(&index) = store.data_to_index.get(&data) {
            return TypeId(index);
        }
        let index = store.index_to_data.len() as u32;
        store.index_to_data.push(data);
        store.data_to_index.insert(data, index);
        TypeId(index)
    }

    fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.types
            .read()
            .expect("types lock poisoned")
            .index_to_data
            .get(id.0 as usize)
            .copied()
    }

    fn intern_type_list(&self, items: Vec<TypeId>) -> TypeListId {
        let buffer: TypeListBuffer = items.into_iter().collect();
        let mut lists = self.type_lists.write().expect("type_lists lock poisoned");
        TypeListId(lists.intern(&buffer[..]))
    }

    fn type_list(&self, id: TypeListId) -> Arc<[TypeId]> {
        let lists = self.type_lists.read().expect("type_lists lock poisoned");
        lists.get(id.0).unwrap_or_else(|| lists.empty())
    }

    fn names(&self) -> &NameTable {
        &self.names
    }

    fn class_decl(&self, id: ClassId) -> Option<Arc<ClassDecl>> {
        self.classes
            .read()
            .expect("classes lock poisoned")
            .get(id.0 as usize)
            .cloned()
    }

    fn type_param_decl(&self, id: TypeParamId) -> Option<Arc<TypeParamDecl>> {
        self.type_params
            .read()
            .expect("type_params lock poisoned")
            .get(id.0 as usize)
            .cloned()
    }

    fn method_sig(&self, id: MethodId) -> Option<Arc<MethodSig>> {
        self.methods
            .read()
            .expect("methods lock poisoned")
            .get(id.0 as usize)
            .cloned()
    }

    fn capture_info(&self, id: CaptureId) -> Option<CaptureInfo> {
        self.captures
            .read()
            .expect("captures lock poisoned")
            .get(id.0 as usize)
            .copied()
    }

    fn fresh_capture(&self, origin: TypeId) -> TypeId {
        let id = {
            let mut captures = self.captures.write().expect("captures lock poisoned");
            let id = CaptureId(captures.len() as u32);
            captures.push(CaptureInfo {
                origin,
                upper: TypeId::OBJECT,
                lower: None,
            });
            id
        };
        self.intern(TypeData::Capture(id))
    }

    fn set_capture_bounds(&self, id: CaptureId, upper: TypeId, lower: Option<TypeId>) {
        let mut captures = self.captures.write().expect("captures lock poisoned");
        if let Some(info) = captures.get_mut(id.0 as usize) {
            info.upper = upper;
            info.lower = lower;
        }
    }

    fn fresh_inference_var(&self, param: Option<TypeParamId>) -> TypeId {
        let id = {
            let mut vars = self
                .inference_vars
                .write()
                .expect("inference_vars lock poisoned");
            let id = InferenceVarId(vars.len() as u32);
            vars.push(param);
            id
        };
        self.intern(TypeData::Infer(id))
    }

    fn inference_var_param(&self, id: InferenceVarId) -> Option<TypeParamId> {
        self.inference_vars
            .read()
            .expect("inference_vars lock poisoned")
            .get(id.0 as usize)
            .copied()
            .flatten()
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
