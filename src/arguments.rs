//! Copy-on-write argument pack with signature-driven extraction (§4.3).
//!
//! Grounded on the teacher's `core::value::ArrayData`: a `Rc`-shared payload
//! that is cloned only when a mutation would otherwise be observed through
//! another handle. `PackagedArguments` applies the same discipline to a flat
//! argument vector instead of a PHP array.

use std::rc::Rc;

use smallvec::SmallVec;

use crate::error::{MetaError, MetaResult};
use crate::variable::Variable;

type Inline = SmallVec<[Variable; 4]>;

/// A shared, copy-on-write vector of `Variable`s passed between a signal and
/// its slots.
#[derive(Clone)]
pub struct PackagedArguments {
    values: Rc<Inline>,
}

impl PackagedArguments {
    pub fn empty() -> Self {
        Self { values: Rc::new(SmallVec::new()) }
    }

    pub fn from_vec(values: Vec<Variable>) -> Self {
        Self { values: Rc::new(values.into_iter().collect()) }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Variable> {
        self.values.get(index)
    }

    /// Appends `value`, cloning the shared backing storage first if another
    /// handle is holding a reference to it (copy-on-write).
    pub fn push(&mut self, value: Variable) {
        Rc::make_mut(&mut self.values).push(value);
    }

    /// Inserts `value` at the front, shifting the rest back one slot.
    /// Copy-on-write, same as `push`.
    pub fn add_front(&mut self, value: Variable) {
        Rc::make_mut(&mut self.values).insert(0, value);
    }

    /// Appends every element of `other` onto the end of `self`, in order.
    pub fn cat(&mut self, other: &PackagedArguments) {
        let inner = Rc::make_mut(&mut self.values);
        inner.extend(other.values.iter().cloned());
    }

    /// Prepends every element of `other` in front of `self`'s own elements,
    /// in order — the package-level counterpart to `add_front`.
    pub fn prepend(&mut self, other: &PackagedArguments) {
        let inner = Rc::make_mut(&mut self.values);
        let mut combined: Inline = other.values.iter().cloned().collect();
        combined.extend(inner.drain(..));
        *inner = combined;
    }

    /// Extracts a typed tuple matching a slot's call signature, converting
    /// each element through its registered `TypeRegistry` converter as
    /// needed. Fails with `SignatureMismatch` on an arity mismatch.
    pub fn to_tuple<T: FromArguments>(&self) -> MetaResult<T> {
        T::from_arguments(self)
    }
}

/// Implemented for the tuple shapes `to_tuple` can extract into.
pub trait FromArguments: Sized {
    fn from_arguments(args: &PackagedArguments) -> MetaResult<Self>;
}

impl FromArguments for () {
    /// `arity(()) == 0`, so any argument count (including extra trailing
    /// arguments) satisfies it — §4.3's "`to_tuple` does not drop extra
    /// arguments beyond `arity(F)` — they are simply ignored".
    fn from_arguments(_args: &PackagedArguments) -> MetaResult<Self> {
        Ok(())
    }
}

macro_rules! impl_from_arguments {
    ($count:expr; $($idx:tt => $name:ident),+) => {
        impl<$($name: Clone + 'static),+> FromArguments for ($($name,)+) {
            fn from_arguments(args: &PackagedArguments) -> MetaResult<Self> {
                if args.len() < $count {
                    return Err(MetaError::SignatureMismatch);
                }
                Ok(($(
                    args.get($idx).expect("length checked above").get::<$name>()?,
                )+))
            }
        }
    };
}

impl_from_arguments!(1; 0 => A);
impl_from_arguments!(2; 0 => A, 1 => B);
impl_from_arguments!(3; 0 => A, 1 => B, 2 => C);
impl_from_arguments!(4; 0 => A, 1 => B, 2 => C, 3 => D);
