//! `MetaObject` / `Object`: base entity with a name, and the
//! executable-extensions host (§3, §4.6).
//!
//! Grounded on the teacher's `runtime::context::EngineContext`, which owns a
//! registry and looks things up by name the same way `Object` owns its
//! extension map.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::arguments::PackagedArguments;
use crate::error::{MetaError, MetaResult};
use crate::extension::ObjectExtension;
use crate::metaclass::MetaClass;
use crate::variable::Variable;

/// Minimal "has a valid meta-name" capability shared by `Object` and
/// `ObjectExtension` (§3).
pub trait MetaObject {
    fn name(&self) -> &str;
}

/// An instance of a metaclass: owns a name and a set of attached extensions.
pub struct Object {
    name: String,
    metaclass: Rc<MetaClass>,
    extensions: RefCell<IndexMap<String, Rc<dyn ObjectExtension>>>,
}

impl Object {
    pub fn new(name: impl Into<String>, metaclass: Rc<MetaClass>) -> Rc<Self> {
        Rc::new(Self { name: name.into(), metaclass, extensions: RefCell::new(IndexMap::new()) })
    }

    pub fn metaclass(&self) -> &Rc<MetaClass> {
        &self.metaclass
    }

    /// Attaches `ext` to this object under `ext.name()`.
    ///
    /// Fails (without panicking) if `ext` is already attached to this or
    /// any other object — the one ownership failure mode the spec treats
    /// as recoverable rather than a fatal precondition violation.
    pub fn add_extension(self: &Rc<Self>, ext: Rc<dyn ObjectExtension>) -> MetaResult<()> {
        if ext.is_attached() {
            let name = ext.name().to_string();
            crate::library::Library::trace_error(&format!("extension '{name}' already belongs to an object"));
            return Err(MetaError::ExtensionAlreadyOwned(name));
        }
        let name = ext.name().to_string();
        ext.attach(self);
        self.extensions.borrow_mut().insert(name, ext);
        Ok(())
    }

    /// Detaches and removes `ext`.
    ///
    /// # Panics
    /// Panics if `ext` is not currently owned by this object (§7:
    /// precondition violation).
    pub fn remove_extension(&self, ext: &Rc<dyn ObjectExtension>) {
        let owned_by_self = ext.host().map(|h| std::ptr::eq(&*h, self)).unwrap_or(false);
        if !owned_by_self {
            panic!("remove_extension: '{}' is not owned by this object", ext.name());
        }
        ext.detach();
        self.extensions.borrow_mut().shift_remove(ext.name());
    }

    pub fn find_extension(&self, name: &str) -> Option<Rc<dyn ObjectExtension>> {
        self.extensions.borrow().get(name).cloned()
    }

    /// Invokes the named extension, or returns `None` if no such extension
    /// is attached.
    pub fn invoke(&self, name: &str, args: &PackagedArguments) -> Option<Variable> {
        self.find_extension(name)?.run(args)
    }

    pub fn extension_names(&self) -> Vec<String> {
        self.extensions.borrow().keys().cloned().collect()
    }
}

impl MetaObject for Object {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::ExtensionCore;
    use crate::metaclass::{ClassKind, MetaClass};
    use std::any::Any;
    use std::rc::Weak;

    struct Echo(ExtensionCore);

    impl Echo {
        fn new(name: &str) -> Rc<Self> {
            Rc::new_cyclic(|weak_self| {
                let weak_self: Weak<dyn ObjectExtension> = weak_self.clone();
                Echo(ExtensionCore::new(name, weak_self))
            })
        }
    }

    impl ObjectExtension for Echo {
        fn core(&self) -> &ExtensionCore {
            &self.0
        }
        fn run_override(&self, _args: &PackagedArguments) -> crate::error::MetaResult<Option<Variable>> {
            Ok(Some(Variable::new(1i64)))
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn object_metaclass() -> Rc<MetaClass> {
        MetaClass::builder("Object", ClassKind::Concrete).seal()
    }

    #[test]
    fn invoke_missing_extension_returns_none() {
        let object = Object::new("o", object_metaclass());
        let args = PackagedArguments::empty();
        assert!(object.invoke("missing", &args).is_none());
    }

    #[test]
    fn attach_then_invoke_by_name() {
        let object = Object::new("o", object_metaclass());
        let ext = Echo::new("echo");
        object.add_extension(ext.clone()).unwrap();
        assert!(Rc::ptr_eq(&object.find_extension("echo").unwrap(), &(ext as Rc<dyn ObjectExtension>)));
        let args = PackagedArguments::empty();
        assert_eq!(*object.invoke("echo", &args).unwrap().downcast_ref::<i64>().unwrap(), 1);
    }

    #[test]
    fn double_attach_fails_without_panicking() {
        let object_a = Object::new("a", object_metaclass());
        let object_b = Object::new("b", object_metaclass());
        let ext = Echo::new("echo");
        object_a.add_extension(ext.clone()).unwrap();
        let result = object_b.add_extension(ext);
        assert!(result.is_err());
    }

    #[test]
    #[should_panic]
    fn remove_unowned_extension_panics() {
        let object = Object::new("o", object_metaclass());
        let ext: Rc<dyn ObjectExtension> = Echo::new("echo");
        object.remove_extension(&ext);
    }
}
