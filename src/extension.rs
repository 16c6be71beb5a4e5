//! `ObjectExtension`: a named invocable attached to at most one host object
//! (§3, §4.7).
//!
//! Grounded on the teacher's `runtime::registry::ExtensionRegistry` for the
//! name/ownership bookkeeping discipline (duplicate rejection, exactly-one
//! owner); the reentrancy-safe `run` wrapper is new (§5 has no PHP
//! analogue) and is built directly from the guarded-sequence contract in
//! `container`.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::arguments::PackagedArguments;
use crate::connection::Connection;
use crate::container::GuardedSequence;
use crate::error::MetaResult;
use crate::object::Object;
use crate::variable::Variable;

pub type ConnectionContainer = GuardedSequence<Option<Rc<Connection>>>;

/// Common fields every concrete extension embeds. Rust has no base-class
/// field inheritance, so extensions hold an `ExtensionCore` and implement
/// `ObjectExtension::core()` to expose it — the same "has-a core, dispatch
/// through a trait" shape the teacher uses for `Extension` + `ExtensionInfo`.
///
/// `self_weak` is populated via `Rc::new_cyclic` by every concrete
/// extension's constructor so that `disconnect_target` and endpoint checks
/// can recover `Rc<dyn ObjectExtension>` from a plain `&self` method.
pub struct ExtensionCore {
    name: String,
    self_weak: Weak<dyn ObjectExtension>,
    host: RefCell<Weak<Object>>,
    connections: ConnectionContainer,
    retained: RefCell<Vec<Rc<dyn ObjectExtension>>>,
}

impl ExtensionCore {
    pub fn new(name: impl Into<String>, self_weak: Weak<dyn ObjectExtension>) -> Self {
        Self {
            name: name.into(),
            self_weak,
            host: RefCell::new(Weak::new()),
            connections: ConnectionContainer::new(),
            retained: RefCell::new(Vec::new()),
        }
    }

    pub fn self_rc(&self) -> Option<Rc<dyn ObjectExtension>> {
        self.self_weak.upgrade()
    }

    pub fn connections(&self) -> &ConnectionContainer {
        &self.connections
    }

    /// Strongly retains `ext` for as long as a connection to it exists.
    /// `Connection` itself only weakly references its endpoints (§3), so
    /// the side that originates a connection (the signal) is what keeps an
    /// otherwise-unowned slot alive — mirroring a `shared_ptr` kept by the
    /// connecting call in the source this crate is modeled on.
    pub fn retain(&self, ext: Rc<dyn ObjectExtension>) {
        self.retained.borrow_mut().push(ext);
    }

    /// Releases a previously retained `ext`, if this core was the one
    /// holding it. A no-op if it wasn't (e.g. called on the target side).
    pub fn release(&self, ext: &Rc<dyn ObjectExtension>) {
        self.retained.borrow_mut().retain(|held| !Rc::ptr_eq(held, ext));
    }
}

/// A named, invocable unit attached to an `Object` at runtime (§4.7).
pub trait ObjectExtension: Any {
    fn core(&self) -> &ExtensionCore;

    /// The per-extension behavior. Called only through `run`, which wraps
    /// this with the container guard and exception-to-`None` policy (§7).
    fn run_override(&self, args: &PackagedArguments) -> MetaResult<Option<Variable>>;

    fn on_attached(&self) {}
    fn on_detached(&self) {}

    /// Needed so callers holding `Rc<dyn ObjectExtension>` can downcast to
    /// a concrete extension type (e.g. `SignalExtension::connect(name)`
    /// resolving a target by name).
    fn as_any(&self) -> &dyn Any;

    fn name(&self) -> &str {
        &self.core().name
    }

    fn host(&self) -> Option<Rc<Object>> {
        self.core().host.borrow().upgrade()
    }

    fn is_attached(&self) -> bool {
        self.host().is_some()
    }

    /// Sets the back-pointer and fires `on_attached`. Called by
    /// `Object::add_extension`, never directly.
    fn attach(&self, host: &Rc<Object>) {
        *self.core().host.borrow_mut() = Rc::downgrade(host);
        self.on_attached();
    }

    /// Clears the back-pointer and fires `on_detached`.
    fn detach(&self) {
        *self.core().host.borrow_mut() = Weak::new();
        self.on_detached();
    }

    /// The sole public entry point (§4.7): reentrancy-safe because the
    /// connections container is retained (guarded) across the call, and
    /// `run_override` errors are logged-and-swallowed rather than
    /// propagated (§7).
    fn run(&self, args: &PackagedArguments) -> Option<Variable> {
        let _guard = self.core().connections.guard();
        match self.run_override(args) {
            Ok(result) => result,
            Err(err) => {
                crate::library::Library::trace_error(&format!("extension '{}': {err}", self.name()));
                None
            }
        }
    }

    /// Inserts `connection` into this extension's container.
    ///
    /// # Panics
    /// Panics if `connection` is already present — a precondition
    /// violation per §7.
    fn add_connection(&self, connection: Rc<Connection>) {
        let already = self
            .core()
            .connections
            .find(|c| matches!(c, Some(existing) if Rc::ptr_eq(existing, &connection)))
            .is_some();
        if already {
            panic!("connection already present in extension '{}'", self.name());
        }
        self.core().connections.push(Some(connection));
    }

    /// Removes `connection` from this extension's container, and from
    /// whichever other endpoint still resolves — a `Connection` is always
    /// registered in both its source's and its target's containers, so a
    /// one-sided removal would leave a dangling, still-valid-looking entry
    /// on the other side.
    ///
    /// # Panics
    /// Panics if `connection` is not present in this extension's own
    /// container — a precondition violation.
    fn remove_connection(&self, connection: &Rc<Connection>) {
        let removed = self
            .core()
            .connections
            .erase_first(|c| matches!(c, Some(existing) if Rc::ptr_eq(existing, connection)));
        if !removed {
            panic!("connection not present in extension '{}'", self.name());
        }

        let self_rc = self.core().self_rc();
        let other = [connection.source(), connection.target()].into_iter().flatten().find(|ext| match &self_rc {
            Some(self_rc) => !Rc::ptr_eq(ext, self_rc),
            None => true,
        });
        if let Some(other) = &other {
            other
                .core()
                .connections
                .erase_first(|c| matches!(c, Some(existing) if Rc::ptr_eq(existing, connection)));
        }

        // Whichever side originated this connection was the one retaining
        // its target strongly; release that hold now that the connection
        // is torn down on both sides.
        if let Some(target) = connection.target() {
            self.core().release(&target);
            if let Some(other) = &other {
                other.core().release(&target);
            }
        }
    }

    /// Tears down every connection touching this extension.
    fn disconnect(&self) {
        while let Some(Some(connection)) = self.core().connections.find(|c| c.is_some()) {
            self.remove_connection(&connection);
        }
    }

    /// Tears down only connections in which this extension is the target.
    fn disconnect_target(&self) {
        let self_rc = self.core().self_rc();
        loop {
            let next = self.core().connections.find(|c| match (c, &self_rc) {
                (Some(connection), Some(self_rc)) => !connection.has_source(self_rc),
                (Some(_), None) => true,
                (None, _) => false,
            });
            match next {
                Some(Some(connection)) => self.remove_connection(&connection),
                _ => break,
            }
        }
    }

    /// Linear search over this extension's connections. Not safe against
    /// concurrent mutation (§4.7) — callers needing that must hold a guard
    /// via `core().connections.guard()` themselves.
    fn find_connection(&self, predicate: impl Fn(&Connection) -> bool) -> Option<Rc<Connection>> {
        self.core().connections.find(|c| matches!(c, Some(conn) if predicate(conn))).flatten()
    }
}
