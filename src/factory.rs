//! `ObjectFactory`: process-wide `meta_name -> MetaClass` registry (§4.5).
//!
//! Grounded on the teacher's `runtime::registry::ExtensionRegistry::register_extension`
//! (name-keyed registration, duplicate detection) lifted from a per-request
//! registry into a `Mutex`-guarded process singleton, since §5 requires the
//! factory to tolerate concurrent register/create/override calls.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::metaclass::MetaClass;
use crate::object::Object;

struct Registry {
    by_name: IndexMap<String, Rc<MetaClass>>,
}

thread_local! {
    // `Rc<MetaClass>` is not `Send`, and neither is the rest of this crate's
    // object graph (`Object`, `ObjectExtension` are all `Rc`-based) — the
    // whole graph is confined to one thread by construction, so the registry
    // is `thread_local` rather than a `Mutex`-guarded global. §5's "reads and
    // writes must be externally serialized by the embedder" describes an
    // embedder that runs this core from a single thread at a time, which is
    // exactly what `thread_local` gives for free.
    static REGISTRY: RefCell<Registry> = RefCell::new(Registry { by_name: IndexMap::new() });
}

/// Thread-local `meta_name -> MetaClass` registry (§4.5).
pub struct ObjectFactory;

impl ObjectFactory {
    /// Inserts `metaclass` by name if absent, then recursively registers any
    /// of its not-yet-registered super-metaclasses.
    pub fn register(metaclass: Rc<MetaClass>) {
        REGISTRY.with(|reg| Self::register_locked(&mut reg.borrow_mut(), metaclass));
    }

    fn register_locked(reg: &mut Registry, metaclass: Rc<MetaClass>) {
        let name = metaclass.name().to_string();
        let supers = metaclass.supers();
        if !reg.by_name.contains_key(&name) {
            reg.by_name.insert(name, metaclass);
        }
        for sup in supers {
            Self::register_locked(reg, sup);
        }
    }

    /// Replaces the binding for `metaclass.name()`.
    ///
    /// # Panics
    /// Panics if no binding for that name exists yet — `override` requires
    /// an existing entry (§4.5).
    pub fn override_binding(metaclass: Rc<MetaClass>) {
        REGISTRY.with(|reg| {
            let mut reg = reg.borrow_mut();
            let name = metaclass.name().to_string();
            assert!(reg.by_name.contains_key(&name), "ObjectFactory::override: no existing binding for '{name}'");
            reg.by_name.insert(name, metaclass);
        });
    }

    pub fn find(name: &str) -> Option<Rc<MetaClass>> {
        REGISTRY.with(|reg| reg.borrow().by_name.get(name).cloned())
    }

    /// Looks up `class_name` and instantiates it as `instance_name`,
    /// attaching every extension metaclass along the inheritance chain
    /// (leaves-up, duplicate names skipped, abstract extensions skipped).
    pub fn create(class_name: &str, instance_name: &str) -> Option<Rc<Object>> {
        let metaclass = Self::find(class_name)?;
        let object = metaclass.create_object(instance_name)?;

        let mut seen = HashSet::new();
        let mut extension_classes = Vec::new();
        collect_extension_metaclasses(&metaclass, &mut seen, &mut extension_classes);

        for ext_class in extension_classes {
            if ext_class.is_abstract() {
                continue;
            }
            if let Some(ext) = ext_class.create_extension(ext_class.name()) {
                if let Err(err) = object.add_extension(ext) {
                    crate::library::Library::trace_error(&format!("factory: {err}"));
                }
            }
        }

        Some(object)
    }
}

fn collect_extension_metaclasses(metaclass: &Rc<MetaClass>, seen: &mut HashSet<String>, out: &mut Vec<Rc<MetaClass>>) {
    for sup in metaclass.supers() {
        collect_extension_metaclasses(&sup, seen, out);
    }
    for (name, ext_class) in metaclass.extensions() {
        if seen.insert(name) {
            out.push(ext_class);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metaclass::ClassKind;

    fn unique_name(prefix: &str) -> String {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        format!("{prefix}{}", COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    #[test]
    fn register_then_find() {
        let name = unique_name("FactoryTest");
        let metaclass = MetaClass::builder(name.clone(), ClassKind::Concrete).seal();
        ObjectFactory::register(metaclass);
        assert!(ObjectFactory::find(&name).is_some());
    }

    #[test]
    fn create_returns_none_for_unregistered_class() {
        assert!(ObjectFactory::create("DoesNotExistAnywhere", "x").is_none());
    }

    #[test]
    fn create_attaches_extension_metaclasses_from_chain() {
        let base_name = unique_name("Base");
        let ext_name = unique_name("Ext");
        let ext_class = MetaClass::builder(ext_name.clone(), ClassKind::Extension);
        ext_class.set_extension_factory({
            let ext_name = ext_name.clone();
            move |_instance_name| {
                crate::invokable::closure_extension(&ext_name, |_args| Ok(None))
            }
        });
        let ext_class = ext_class.seal();

        let base_class = MetaClass::builder(base_name.clone(), ClassKind::Concrete);
        base_class.add_meta_extension(ext_class).unwrap();
        base_class.set_object_factory(|name, metaclass| crate::object::Object::new(name, metaclass));
        let base_class = base_class.seal();

        ObjectFactory::register(base_class);
        let object = ObjectFactory::create(&base_name, "instance").unwrap();
        assert!(object.find_extension(&ext_name).is_some());
    }
}
