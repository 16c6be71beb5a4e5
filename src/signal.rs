//! `SignalExtension` and typed `Signal<Args>` (§4.8).
//!
//! Grounded on the teacher's `runtime::extension::Extension` lifecycle-hook
//! dispatch loop (`request_init_all` iterating a `Vec<Box<dyn Extension>>`,
//! catching and `eprintln!`-logging per-entry failures) generalized from a
//! fixed list of extensions to a guarded, insertion-ordered connection
//! snapshot that tolerates mutation mid-iteration.

use std::any::Any;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::arguments::{FromArguments, PackagedArguments};
use crate::connection::Connection;
use crate::error::MetaResult;
use crate::extension::{ExtensionCore, ObjectExtension};
use crate::variable::Variable;

type VerifySignature = dyn Fn(&PackagedArguments) -> bool;

/// A concrete extension representing one signal. `run_override` verifies
/// the signature, then invokes every valid, source-matching connection's
/// target, returning the activation count wrapped in a `Variable`.
pub struct SignalExtension {
    core: ExtensionCore,
    verify_signature: Box<VerifySignature>,
}

impl SignalExtension {
    pub fn new(name: &str, verify_signature: impl Fn(&PackagedArguments) -> bool + 'static) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| {
            let weak_self: Weak<dyn ObjectExtension> = weak_self.clone();
            SignalExtension { core: ExtensionCore::new(name, weak_self), verify_signature: Box::new(verify_signature) }
        })
    }

    /// Connects `slot` as a target of this signal: creates a `Connection`,
    /// inserts it into both endpoints' containers, and returns it.
    ///
    /// `Connection` only weakly references its endpoints (§3), so this
    /// signal strongly retains `slot` for as long as the connection lives —
    /// otherwise a slot with no other owner (the common case in a bare
    /// `connect(closure_extension(...))` call) would be dropped the moment
    /// this function returns.
    pub fn connect(self: &Rc<Self>, slot: Rc<dyn ObjectExtension>) -> Rc<Connection> {
        let self_dyn: Rc<dyn ObjectExtension> = self.clone();
        let connection = Connection::new(Rc::downgrade(&self_dyn), Rc::downgrade(&slot));
        self_dyn.add_connection(connection.clone());
        slot.add_connection(connection.clone());
        self.core.retain(slot);
        connection
    }

    /// Resolves `name` against this signal's owning object and connects to
    /// that extension. Returns `None` when not attached or when `name` is
    /// unknown — both treated as a clean failure, not an error (§4.8).
    pub fn connect_by_name(self: &Rc<Self>, name: &str) -> Option<Rc<Connection>> {
        let host = self.host()?;
        let slot = host.find_extension(name)?;
        Some(self.connect(slot))
    }

    /// Removes `connection` from both endpoints, whichever still resolve.
    /// `ObjectExtension::remove_connection` already tears down both sides of
    /// a connection, so only one endpoint needs to be asked.
    pub fn disconnect(&self, connection: &Rc<Connection>) {
        if let Some(source) = connection.source() {
            source.remove_connection(connection);
        } else if let Some(target) = connection.target() {
            target.remove_connection(connection);
        }
    }
}

impl ObjectExtension for SignalExtension {
    fn core(&self) -> &ExtensionCore {
        &self.core
    }

    fn run_override(&self, args: &PackagedArguments) -> MetaResult<Option<Variable>> {
        if !(self.verify_signature)(args) {
            return Ok(None);
        }

        let self_rc = self.core.self_rc();
        let guard = self.core.connections().guard();
        let mut activated = 0i64;

        for idx in 0..guard.len() {
            let Some(Some(connection)) = guard.get(idx) else { continue };
            if !connection.is_valid() {
                continue;
            }
            if let Some(self_rc) = &self_rc {
                if !connection.has_source(self_rc) {
                    continue;
                }
            }
            let Some(target) = connection.target() else { continue };
            if target.run(args).is_some() {
                activated += 1;
            }
        }

        Ok(Some(Variable::new(activated)))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A statically typed signal wrapper over `SignalExtension` (§4.8). `Args`
/// is the tuple of argument types the signal carries; `verify_signature`
/// checks arity and per-argument convertibility through `to_tuple::<Args>()`.
pub struct Signal<Args> {
    extension: Rc<SignalExtension>,
    _marker: PhantomData<Args>,
}

impl<Args> Signal<Args>
where
    Args: FromArguments + 'static,
{
    pub fn new(name: &str) -> Self {
        let extension = SignalExtension::new(name, |args| args.to_tuple::<Args>().is_ok());
        Self { extension, _marker: PhantomData }
    }

    pub fn extension(&self) -> &Rc<SignalExtension> {
        &self.extension
    }

    pub fn connect(&self, slot: Rc<dyn ObjectExtension>) -> Rc<Connection> {
        self.extension.connect(slot)
    }

    pub fn connect_by_name(&self, name: &str) -> Option<Rc<Connection>> {
        self.extension.connect_by_name(name)
    }

    pub fn disconnect(&self, connection: &Rc<Connection>) {
        self.extension.disconnect(connection)
    }

    /// Packages `args` and triggers the signal. Returns the number of
    /// slots activated, or `-1` if `args` does not satisfy the signature
    /// (§7: "trigger returns the count of successfully activated slots, or
    /// -1 when signature verification failed").
    pub fn trigger(&self, args: Vec<Variable>) -> i64 {
        let packaged = PackagedArguments::from_vec(args);
        match self.extension.run(&packaged) {
            Some(count) => *count.downcast_ref::<i64>().expect("SignalExtension::run_override always returns an i64 count"),
            None => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invokable::{closure_extension, self_aware_extension};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn signal_with_no_slots_returns_zero() {
        let signal: Signal<()> = Signal::new("sigVoid");
        assert_eq!(signal.trigger(vec![]), 0);
    }

    #[test]
    fn void_signal_with_one_slot_logs_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let signal: Signal<()> = Signal::new("sigVoid");
        let log_clone = log.clone();
        let slot = closure_extension("logger", move |_args| {
            log_clone.borrow_mut().push("function".to_string());
            Ok(Some(Variable::empty()))
        });
        signal.connect(slot);
        assert_eq!(signal.trigger(vec![]), 1);
        assert_eq!(*log.borrow(), vec!["function".to_string()]);
    }

    #[test]
    fn integer_signal_forwards_to_two_slots() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let signal: Signal<(i64,)> = Signal::new("sigInt");

        let log_a = log.clone();
        let slot_a = closure_extension("a", move |_args| {
            log_a.borrow_mut().push("function".to_string());
            Ok(Some(Variable::empty()))
        });
        let log_b = log.clone();
        let slot_b = closure_extension("b", move |args| {
            let (n,): (i64,) = args.to_tuple()?;
            log_b.borrow_mut().push(format!("function({n})"));
            Ok(Some(Variable::empty()))
        });

        signal.connect(slot_a);
        signal.connect(slot_b);
        assert_eq!(signal.trigger(vec![Variable::new(10i64)]), 2);
        assert_eq!(*log.borrow(), vec!["function".to_string(), "function(10)".to_string()]);
    }

    #[test]
    fn trigger_below_arity_returns_negative_one_without_invoking_slots() {
        let invoked = Rc::new(RefCell::new(false));
        let signal: Signal<(i64,)> = Signal::new("sigInt");
        let invoked_clone = invoked.clone();
        let slot = closure_extension("noop", move |_args| {
            *invoked_clone.borrow_mut() = true;
            Ok(Some(Variable::empty()))
        });
        signal.connect(slot);
        assert_eq!(signal.trigger(vec![]), -1);
        assert!(!*invoked.borrow());
    }

    #[test]
    fn self_disconnect_inside_slot_shrinks_container_after_trigger() {
        let signal: Signal<()> = Signal::new("sigVoid");
        let slot = self_aware_extension("self_disconnect", |me, _args| {
            me.disconnect();
            Ok(Some(Variable::empty()))
        });
        let connection = signal.connect(slot);
        assert_eq!(signal.trigger(vec![]), 1);
        // The signal was the slot's only strong owner (retained for the
        // connection's lifetime); once the self-disconnect releases that
        // hold, the slot is dropped and the connection's weak target no
        // longer resolves.
        assert!(!connection.is_valid());
        assert_eq!(signal.extension().core().connections().len(), 0);
    }

    #[test]
    fn connect_in_slot_doubles_connections_each_trigger() {
        let signal: Signal<()> = Signal::new("sigVoid");
        let signal_ext = signal.extension().clone();

        fn doubling_slot(signal_ext: Rc<SignalExtension>) -> Rc<dyn ObjectExtension> {
            self_aware_extension("doubler", move |_me, _args| {
                let clone_ext = doubling_slot(signal_ext.clone());
                signal_ext.connect(clone_ext);
                Ok(Some(Variable::empty()))
            })
        }

        let first = doubling_slot(signal_ext.clone());
        signal.connect(first);

        assert_eq!(signal.trigger(vec![]), 1);
        assert_eq!(signal.trigger(vec![]), 2);
        assert_eq!(signal.trigger(vec![]), 4);
        assert_eq!(signal.trigger(vec![]), 8);
    }

    #[test]
    fn connection_created_inside_slot_is_excluded_from_current_trigger() {
        let signal: Signal<()> = Signal::new("sigVoid");
        let count = Rc::new(RefCell::new(0));
        let signal_ext = signal.extension().clone();
        let count_clone = count.clone();
        let adder = self_aware_extension("adder", move |_me, _args| {
            *count_clone.borrow_mut() += 1;
            let extra = closure_extension("extra", |_args| Ok(Some(Variable::empty())));
            signal_ext.connect(extra);
            Ok(Some(Variable::empty()))
        });
        signal.connect(adder);
        assert_eq!(signal.trigger(vec![]), 1);
        assert_eq!(*count.borrow(), 1);
    }
}
