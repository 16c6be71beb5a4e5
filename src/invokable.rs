//! `Invokable`: wraps a callable as an `ObjectExtension` (§4.9).
//!
//! Grounded on the teacher's `runtime::example_extension::ExampleExtension`,
//! which wraps a plain `fn(&mut VM, args: &[Handle]) -> Result<Handle, String>`.
//! The source's compile-time signature reflection (deriving arity and
//! argument types from an arbitrary callable `F`, then auto-prepending an
//! owner/self pointer depending on `F`'s declared first parameter) has no
//! direct Rust equivalent without a generic "function signature" trait the
//! corpus never needed; instead each prepend shape gets its own constructor,
//! all producing the same boxed-closure extension underneath.

use std::any::Any;
use std::rc::{Rc, Weak};

use crate::arguments::PackagedArguments;
use crate::error::{MetaError, MetaResult};
use crate::extension::{ExtensionCore, ObjectExtension};
use crate::object::Object;
use crate::variable::Variable;

type Body = dyn Fn(&dyn ObjectExtension, &PackagedArguments) -> MetaResult<Option<Variable>>;

/// An extension whose behavior is a boxed closure rather than a hand-written
/// `ObjectExtension` impl.
pub struct Invokable {
    core: ExtensionCore,
    body: Box<Body>,
}

impl Invokable {
    fn new(name: &str, body: Box<Body>) -> Rc<Self> {
        Rc::new_cyclic(|weak_self| {
            let weak_self: Weak<dyn ObjectExtension> = weak_self.clone();
            Invokable { core: ExtensionCore::new(name, weak_self), body }
        })
    }
}

impl ObjectExtension for Invokable {
    fn core(&self) -> &ExtensionCore {
        &self.core
    }

    fn run_override(&self, args: &PackagedArguments) -> MetaResult<Option<Variable>> {
        (self.body)(self, args)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Wraps a plain closure over `PackagedArguments`, no prepending — the
/// direct analogue of `example_extension.rs`'s free-function wrapper.
pub fn closure_extension(
    name: &str,
    f: impl Fn(&PackagedArguments) -> MetaResult<Option<Variable>> + 'static,
) -> Rc<dyn ObjectExtension> {
    Invokable::new(name, Box::new(move |_ext, args| f(args)))
}

/// Wraps a closure that additionally receives the owning `Object` — the
/// "prepend a pointer to the owner Object" case from §4.9, step 1. The
/// owner is genuinely prepended onto a fresh `PackagedArguments` via
/// `add_front`, then recovered through `to_tuple` before the call, matching
/// the repackage-via-`PackagedArguments` data flow rather than smuggling it
/// in as a second native closure parameter.
///
/// Fails with `BadTypeId` if called while detached (no owner to prepend).
pub fn method_extension(
    name: &str,
    f: impl Fn(&Object, &PackagedArguments) -> MetaResult<Option<Variable>> + 'static,
) -> Rc<dyn ObjectExtension> {
    Invokable::new(
        name,
        Box::new(move |ext, args| {
            let host = ext.host().ok_or(MetaError::BadTypeId)?;
            let mut prepended = args.clone();
            prepended.add_front(Variable::new(host));
            let (owner,): (Rc<Object>,) = prepended.to_tuple()?;
            f(&owner, args)
        }),
    )
}

/// Wraps a closure that additionally receives `self` as an
/// `&dyn ObjectExtension` — the "prepend a pointer to self" case from
/// §4.9, step 1, used when a slot needs to call back into its own
/// connection container (e.g. connect-in-slot, self-disconnect). Goes
/// through the same prepend-then-extract `PackagedArguments` round trip as
/// `method_extension`.
pub fn self_aware_extension(
    name: &str,
    f: impl Fn(&dyn ObjectExtension, &PackagedArguments) -> MetaResult<Option<Variable>> + 'static,
) -> Rc<dyn ObjectExtension> {
    Invokable::new(
        name,
        Box::new(move |ext, args| {
            let self_rc = ext.core().self_rc().ok_or(MetaError::BadTypeId)?;
            let mut prepended = args.clone();
            prepended.add_front(Variable::new(self_rc));
            let (me,): (Rc<dyn ObjectExtension>,) = prepended.to_tuple()?;
            f(me.as_ref(), args)
        }),
    )
}
