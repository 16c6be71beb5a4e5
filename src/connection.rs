//! `Connection`: a shared token between a source extension (signal) and a
//! target extension (slot) (§3, §4.8).

use std::rc::{Rc, Weak};

use crate::extension::ObjectExtension;

/// Neither endpoint is owned; both are weak, so a `Connection` never keeps
/// a signal or slot alive on its own (§9 cyclic-risk note).
pub struct Connection {
    source: Weak<dyn ObjectExtension>,
    target: Weak<dyn ObjectExtension>,
}

impl Connection {
    pub(crate) fn new(source: Weak<dyn ObjectExtension>, target: Weak<dyn ObjectExtension>) -> Rc<Self> {
        Rc::new(Self { source, target })
    }

    /// True iff both endpoints still resolve.
    pub fn is_valid(&self) -> bool {
        self.source.upgrade().is_some() && self.target.upgrade().is_some()
    }

    pub fn source(&self) -> Option<Rc<dyn ObjectExtension>> {
        self.source.upgrade()
    }

    pub fn target(&self) -> Option<Rc<dyn ObjectExtension>> {
        self.target.upgrade()
    }

    pub(crate) fn has_source(&self, candidate: &Rc<dyn ObjectExtension>) -> bool {
        match self.source.upgrade() {
            Some(src) => Rc::ptr_eq(&src, candidate),
            None => false,
        }
    }

    pub(crate) fn has_endpoint(&self, candidate: &Rc<dyn ObjectExtension>) -> bool {
        self.has_source(candidate)
            || match self.target.upgrade() {
                Some(tgt) => Rc::ptr_eq(&tgt, candidate),
                None => false,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arguments::PackagedArguments;
    use crate::error::MetaResult;
    use crate::extension::ExtensionCore;
    use crate::variable::Variable;
    use std::any::Any;

    struct Dummy(ExtensionCore);

    impl Dummy {
        fn new(name: &str) -> Rc<Self> {
            Rc::new_cyclic(|weak_self| {
                let weak_self: Weak<dyn ObjectExtension> = weak_self.clone();
                Dummy(ExtensionCore::new(name, weak_self))
            })
        }
    }

    impl ObjectExtension for Dummy {
        fn core(&self) -> &ExtensionCore {
            &self.0
        }
        fn run_override(&self, _args: &PackagedArguments) -> MetaResult<Option<Variable>> {
            Ok(None)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn invalid_once_either_endpoint_drops() {
        let source: Rc<dyn ObjectExtension> = Dummy::new("src");
        let target: Rc<dyn ObjectExtension> = Dummy::new("tgt");
        let connection = Connection::new(Rc::downgrade(&source), Rc::downgrade(&target));
        assert!(connection.is_valid());
        drop(target);
        assert!(!connection.is_valid());
    }
}
