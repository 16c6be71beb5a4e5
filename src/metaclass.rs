//! `MetaClass`: immutable-once-sealed descriptor with inheritance visiting
//! and an extension-metaclass set (§3, §4.4).
//!
//! Grounded on the teacher's `runtime::context::ClassDef` (parent/interface/
//! trait lists, `is_abstract`/`is_interface` flags) generalized from PHP's
//! single-parent-plus-interfaces model to an ordered list of super-metaclasses
//! (the spec's multiple-inheritance visitor replaces PHP's single extends
//! chain). Uses `indexmap::IndexMap` the same way `ClassDef::properties` does,
//! to keep extension declaration order observable.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::container::VisitResult;
use crate::error::{MetaError, MetaResult};
use crate::extension::ObjectExtension;
use crate::meta_name::is_valid_meta_name;
use crate::object::Object;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClassKind {
    /// Describes a class but cannot be instantiated directly.
    Abstract,
    /// A concrete `Object`-producing metaclass.
    Concrete,
    /// A concrete `ObjectExtension`-producing metaclass.
    Extension,
}

type ObjectFactoryFn = dyn Fn(&str, Rc<MetaClass>) -> Rc<Object>;
type ExtensionFactoryFn = dyn Fn(&str) -> Rc<dyn ObjectExtension>;

pub struct MetaClass {
    name: String,
    kind: ClassKind,
    supers: RefCell<Vec<Rc<MetaClass>>>,
    extensions: RefCell<IndexMap<String, Rc<MetaClass>>>,
    sealed: Cell<bool>,
    object_factory: RefCell<Option<Rc<ObjectFactoryFn>>>,
    extension_factory: RefCell<Option<Rc<ExtensionFactoryFn>>>,
}

impl MetaClass {
    /// Starts building a metaclass. Unsealed until `seal()` is called, the
    /// same "registrars run, then sealed" shape as the source's static-init
    /// metaclass bodies (§4.4).
    ///
    /// # Panics
    /// Panics if `name` is not a valid meta-name.
    pub fn builder(name: impl Into<String>, kind: ClassKind) -> Rc<Self> {
        let name = name.into();
        if !is_valid_meta_name(&name) {
            panic!("{}", MetaError::InvalidMetaName(name));
        }
        Rc::new(Self {
            name,
            kind,
            supers: RefCell::new(Vec::new()),
            extensions: RefCell::new(IndexMap::new()),
            sealed: Cell::new(false),
            object_factory: RefCell::new(None),
            extension_factory: RefCell::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn is_extension(&self) -> bool {
        self.kind == ClassKind::Extension
    }

    pub fn is_abstract(&self) -> bool {
        self.kind == ClassKind::Abstract
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.get()
    }

    pub fn add_super(&self, super_class: Rc<MetaClass>) {
        self.supers.borrow_mut().push(super_class);
    }

    pub fn supers(&self) -> Vec<Rc<MetaClass>> {
        self.supers.borrow().clone()
    }

    pub fn extensions(&self) -> IndexMap<String, Rc<MetaClass>> {
        self.extensions.borrow().clone()
    }

    pub fn set_object_factory(&self, factory: impl Fn(&str, Rc<MetaClass>) -> Rc<Object> + 'static) {
        *self.object_factory.borrow_mut() = Some(Rc::new(factory));
    }

    pub fn set_extension_factory(&self, factory: impl Fn(&str) -> Rc<dyn ObjectExtension> + 'static) {
        *self.extension_factory.borrow_mut() = Some(Rc::new(factory));
    }

    pub(crate) fn create_object(self: &Rc<Self>, instance_name: &str) -> Option<Rc<Object>> {
        let factory = self.object_factory.borrow().clone()?;
        Some(factory(instance_name, Rc::clone(self)))
    }

    pub(crate) fn create_extension(&self, instance_name: &str) -> Option<Rc<dyn ObjectExtension>> {
        let factory = self.extension_factory.borrow().clone()?;
        Some(factory(instance_name))
    }

    /// Marks this metaclass sealed. Called once the registrar sequence that
    /// builds it has finished.
    pub fn seal(self: &Rc<Self>) -> Rc<Self> {
        self.sealed.set(true);
        Rc::clone(self)
    }

    /// Reopens a sealed metaclass for further `add_meta_extension` calls —
    /// the `DynamicMetaClass` escape hatch (§4.4), used only by code that
    /// deliberately extends behavior after the fact.
    pub fn reopen(&self) {
        self.sealed.set(false);
    }

    /// Adds `ext` as an extension metaclass of `self`.
    ///
    /// # Panics
    /// Panics if `ext.is_extension()` is false — passing a non-extension
    /// metaclass here is a static-shape invariant violation, not a
    /// recoverable runtime condition.
    pub fn add_meta_extension(&self, ext: Rc<MetaClass>) -> MetaResult<()> {
        if self.sealed.get() {
            return Err(MetaError::MetaClassSealed(self.name.clone()));
        }
        assert!(ext.is_extension(), "add_meta_extension: '{}' is not an extension metaclass", ext.name);
        if self.find_meta_extension(&ext.name).is_some() {
            return Err(MetaError::DuplicateExtension(ext.name.clone()));
        }
        self.extensions.borrow_mut().insert(ext.name.clone(), ext);
        Ok(())
    }

    /// Searches `self` then super-metaclasses (declaration order) for an
    /// extension metaclass named `name`; first match wins (§9 open question
    /// (c)).
    pub fn find_meta_extension(&self, name: &str) -> Option<Rc<MetaClass>> {
        if let Some(found) = self.extensions.borrow().get(name) {
            return Some(Rc::clone(found));
        }
        for sup in self.supers.borrow().iter() {
            if let Some(found) = sup.find_meta_extension(name) {
                return Some(found);
            }
        }
        None
    }

    /// Visits `self`, then each super-metaclass in declaration order
    /// (depth-first), stopping early on `VisitResult::Abort`.
    pub fn visit(&self, visitor: &mut impl FnMut(&MetaClass) -> VisitResult) -> VisitResult {
        if visitor(self) == VisitResult::Abort {
            return VisitResult::Abort;
        }
        for sup in self.supers.borrow().iter() {
            if sup.visit(visitor) == VisitResult::Abort {
                return VisitResult::Abort;
            }
        }
        VisitResult::Continue
    }

    /// True iff a visit starting at `self` reaches a metaclass named `name`.
    pub fn is_derived_from(&self, name: &str) -> bool {
        let mut found = false;
        self.visit(&mut |mc| {
            if mc.name == name {
                found = true;
                VisitResult::Abort
            } else {
                VisitResult::Continue
            }
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic]
    fn invalid_meta_name_panics() {
        MetaClass::builder("bad name!", ClassKind::Concrete);
    }

    #[test]
    fn is_derived_from_walks_supers() {
        let base = MetaClass::builder("Base", ClassKind::Abstract).seal();
        let derived = MetaClass::builder("Derived", ClassKind::Concrete);
        derived.add_super(Rc::clone(&base));
        let derived = derived.seal();
        assert!(derived.is_derived_from("Base"));
        assert!(!base.is_derived_from("Derived"));
    }

    #[test]
    fn sealed_metaclass_rejects_new_extensions() {
        let ext = MetaClass::builder("Ext", ClassKind::Extension).seal();
        let host = MetaClass::builder("Host", ClassKind::Concrete).seal();
        assert_eq!(host.add_meta_extension(ext), Err(MetaError::MetaClassSealed("Host".to_string())));
    }

    #[test]
    fn reopen_allows_dynamic_extension() {
        let ext = MetaClass::builder("Ext2", ClassKind::Extension).seal();
        let host = MetaClass::builder("Host2", ClassKind::Concrete).seal();
        host.reopen();
        assert!(host.add_meta_extension(ext).is_ok());
    }

    #[test]
    fn duplicate_extension_name_rejected() {
        let host = MetaClass::builder("Host3", ClassKind::Concrete);
        let ext_a = MetaClass::builder("Dup", ClassKind::Extension).seal();
        let ext_b = MetaClass::builder("Dup", ClassKind::Extension).seal();
        host.add_meta_extension(ext_a).unwrap();
        assert_eq!(host.add_meta_extension(ext_b), Err(MetaError::DuplicateExtension("Dup".to_string())));
    }

    #[test]
    fn duplicate_rejected_across_super_chain() {
        let base = MetaClass::builder("Base4", ClassKind::Concrete);
        let ext = MetaClass::builder("Shared", ClassKind::Extension).seal();
        base.add_meta_extension(Rc::clone(&ext)).unwrap();
        let base = base.seal();

        let derived = MetaClass::builder("Derived4", ClassKind::Concrete);
        derived.add_super(base);
        let ext_dup = MetaClass::builder("Shared", ClassKind::Extension).seal();
        assert_eq!(derived.add_meta_extension(ext_dup), Err(MetaError::DuplicateExtension("Shared".to_string())));
    }
}

impl std::fmt::Debug for MetaClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetaClass").field("name", &self.name).field("kind", &self.kind).finish()
    }
}
