//! Type-erased value with a registered per-type operator vtable (§4.2).
//!
//! Grounded on the teacher's `core::value::Val`/`Zval`: a tagged union that
//! knows its own type and converts itself on demand. Here the tag is a
//! `TypeInfo` and the payload is `Box<dyn Any>` rather than an enum of
//! built-in PHP types, so arbitrary host types can be stored.

use std::any::Any;
use std::fmt;

use crate::error::{MetaError, MetaResult};
use crate::type_info::TypeInfo;
use crate::type_registry::TypeRegistry;

/// A value of any registered type, carrying enough information to look up
/// its operators and converters at runtime.
pub struct Variable {
    storage: Option<Box<dyn Any>>,
    type_info: Option<TypeInfo>,
    clone_fn: Option<fn(&dyn Any) -> Box<dyn Any>>,
}

impl Variable {
    /// The empty `Variable` — no type, no storage.
    pub fn empty() -> Self {
        Self { storage: None, type_info: None, clone_fn: None }
    }

    /// Wraps `value`, recording its `TypeInfo`.
    pub fn new<T: Clone + 'static>(value: T) -> Self {
        Self {
            storage: Some(Box::new(value)),
            type_info: Some(TypeInfo::of::<T>()),
            clone_fn: Some(|a: &dyn Any| -> Box<dyn Any> {
                Box::new(a.downcast_ref::<T>().expect("clone: storage type mismatch").clone())
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.storage.is_none()
    }

    /// Returns the held type, or `BadTypeId` if this `Variable` is empty.
    pub fn type_of(&self) -> MetaResult<TypeInfo> {
        self.type_info.ok_or(MetaError::BadTypeId)
    }

    pub fn is_type_of<T: 'static>(&self) -> bool {
        self.type_info == Some(TypeInfo::of::<T>())
    }

    /// Borrows the stored value as `T`, or `None` if empty or a different type.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.storage.as_ref()?.downcast_ref::<T>()
    }

    /// Mutably borrows the stored value as `T`, or `None` if empty or a
    /// different type.
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.storage.as_mut()?.downcast_mut::<T>()
    }

    /// `operator->()`: a mutable raw pointer into the stored value via the
    /// registered vtable slot, or null if empty, unregistered, or unsupported.
    pub fn ptr(&mut self) -> *mut () {
        let Some(info) = self.type_info else { return std::ptr::null_mut() };
        let Some(ops) = TypeRegistry::operators(info) else { return std::ptr::null_mut() };
        match ops.ptr {
            Some(f) => f(self.storage.as_mut().unwrap().as_mut()),
            None => std::ptr::null_mut(),
        }
    }

    /// `operator->() const`: same as [`Variable::ptr`] through a const pointer.
    pub fn cptr(&self) -> *const () {
        let Some(info) = self.type_info else { return std::ptr::null() };
        let Some(ops) = TypeRegistry::operators(info) else { return std::ptr::null() };
        match ops.cptr {
            Some(f) => f(self.storage.as_ref().unwrap().as_ref()),
            None => std::ptr::null(),
        }
    }

    /// `operator T()`: returns a clone of the stored value as `T`, converting
    /// through the registry if the stored type differs from `T`.
    pub fn get<T: Clone + 'static>(&self) -> MetaResult<T> {
        let target = TypeInfo::of::<T>();
        let source = self.type_of()?;
        if source == target {
            return Ok(self.downcast_ref::<T>().expect("type_info matched T but downcast failed").clone());
        }
        let converted = TypeRegistry::convert(self.storage.as_ref().unwrap().as_ref(), source, target)?;
        Ok(*converted.downcast::<T>().map_err(|_| MetaError::BadVariableCast { from: source, to: target })?)
    }

    fn ops(&self) -> MetaResult<&'static crate::type_registry::TypeOperators> {
        let info = self.type_of()?;
        TypeRegistry::operators(info).ok_or(MetaError::UnregisteredType(info))
    }

    /// Converts `rhs` to `self`'s type if they differ, or returns a reference
    /// to `rhs`'s own storage if they already match.
    fn coerce<'a>(&self, rhs: &'a Variable) -> MetaResult<CoercedRhs<'a>> {
        let lhs_type = self.type_of()?;
        let rhs_type = rhs.type_of()?;
        if lhs_type == rhs_type {
            Ok(CoercedRhs::Borrowed(rhs.storage.as_ref().unwrap().as_ref()))
        } else {
            let converted = TypeRegistry::convert(rhs.storage.as_ref().unwrap().as_ref(), rhs_type, lhs_type)?;
            Ok(CoercedRhs::Owned(converted))
        }
    }

    fn binary(&self, rhs: &Variable, op_name: &'static str, select: impl Fn(&crate::type_registry::TypeOperators) -> Option<crate::type_registry::BinaryOp>) -> MetaResult<Variable> {
        if self.is_empty() {
            return self.empty_lhs(rhs, op_name);
        }
        let ops = self.ops()?;
        let f = select(ops).ok_or(MetaError::UndefinedOperator(op_name))?;
        let coerced = self.coerce(rhs)?;
        let result = f(self.storage.as_ref().unwrap().as_ref(), coerced.as_ref());
        Ok(Variable { type_info: self.type_info, storage: Some(result), clone_fn: self.clone_fn })
    }

    /// An empty left operand behaves as a copy of `rhs` (or, for `sub`, a
    /// negated copy) rather than failing with `BadTypeId`.
    fn empty_lhs(&self, rhs: &Variable, op_name: &'static str) -> MetaResult<Variable> {
        if rhs.is_empty() {
            return Ok(Variable::empty());
        }
        if op_name == "sub" {
            let zero = rhs.sub(rhs)?;
            zero.sub(rhs)
        } else {
            Ok(rhs.clone())
        }
    }

    fn compare(&self, rhs: &Variable, op_name: &'static str, select: impl Fn(&crate::type_registry::TypeOperators) -> Option<crate::type_registry::CompareOp>) -> MetaResult<bool> {
        let ops = self.ops()?;
        let f = select(ops).ok_or(MetaError::UndefinedOperator(op_name))?;
        let coerced = self.coerce(rhs)?;
        Ok(f(self.storage.as_ref().unwrap().as_ref(), coerced.as_ref()))
    }

    fn unary(&self, op_name: &'static str, select: impl Fn(&crate::type_registry::TypeOperators) -> Option<crate::type_registry::UnaryOp>) -> MetaResult<Variable> {
        let ops = self.ops()?;
        let f = select(ops).ok_or(MetaError::UndefinedOperator(op_name))?;
        let result = f(self.storage.as_ref().unwrap().as_ref());
        Ok(Variable { type_info: self.type_info, storage: Some(result), clone_fn: self.clone_fn })
    }

    fn shift(&self, amount: usize, op_name: &'static str, select: impl Fn(&crate::type_registry::TypeOperators) -> Option<crate::type_registry::ShiftOp>) -> MetaResult<Variable> {
        let ops = self.ops()?;
        let f = select(ops).ok_or(MetaError::UndefinedOperator(op_name))?;
        let result = f(self.storage.as_ref().unwrap().as_ref(), amount);
        Ok(Variable { type_info: self.type_info, storage: Some(result), clone_fn: self.clone_fn })
    }

    pub fn add(&self, rhs: &Variable) -> MetaResult<Variable> {
        self.binary(rhs, "add", |o| o.add)
    }
    pub fn sub(&self, rhs: &Variable) -> MetaResult<Variable> {
        self.binary(rhs, "sub", |o| o.sub)
    }
    pub fn mul(&self, rhs: &Variable) -> MetaResult<Variable> {
        self.binary(rhs, "mul", |o| o.mul)
    }
    pub fn div(&self, rhs: &Variable) -> MetaResult<Variable> {
        self.binary(rhs, "div", |o| o.div)
    }
    pub fn bw_and(&self, rhs: &Variable) -> MetaResult<Variable> {
        self.binary(rhs, "bw_and", |o| o.bw_and)
    }
    pub fn bw_or(&self, rhs: &Variable) -> MetaResult<Variable> {
        self.binary(rhs, "bw_or", |o| o.bw_or)
    }
    pub fn bw_xor(&self, rhs: &Variable) -> MetaResult<Variable> {
        self.binary(rhs, "bw_xor", |o| o.bw_xor)
    }
    pub fn bw_not(&self) -> MetaResult<Variable> {
        self.unary("bw_not", |o| o.bw_not)
    }
    pub fn bw_shl(&self, amount: usize) -> MetaResult<Variable> {
        self.shift(amount, "bw_shl", |o| o.bw_shl)
    }
    pub fn bw_shr(&self, amount: usize) -> MetaResult<Variable> {
        self.shift(amount, "bw_shr", |o| o.bw_shr)
    }
    pub fn land(&self, rhs: &Variable) -> MetaResult<Variable> {
        self.binary(rhs, "land", |o| o.land)
    }
    pub fn lor(&self, rhs: &Variable) -> MetaResult<Variable> {
        self.binary(rhs, "lor", |o| o.lor)
    }
    pub fn lnot(&self) -> MetaResult<Variable> {
        self.unary("lnot", |o| o.lnot)
    }
    pub fn var_eq(&self, rhs: &Variable) -> MetaResult<bool> {
        self.compare(rhs, "eq", |o| o.eq)
    }
    pub fn less(&self, rhs: &Variable) -> MetaResult<bool> {
        self.compare(rhs, "less", |o| o.less)
    }
    pub fn leq(&self, rhs: &Variable) -> MetaResult<bool> {
        self.compare(rhs, "leq", |o| o.leq)
    }
    pub fn gt(&self, rhs: &Variable) -> MetaResult<bool> {
        self.compare(rhs, "gt", |o| o.gt)
    }
    pub fn geq(&self, rhs: &Variable) -> MetaResult<bool> {
        self.compare(rhs, "geq", |o| o.geq)
    }
}

enum CoercedRhs<'a> {
    Borrowed(&'a dyn Any),
    Owned(Box<dyn Any>),
}

impl<'a> CoercedRhs<'a> {
    fn as_ref(&self) -> &dyn Any {
        match self {
            CoercedRhs::Borrowed(r) => *r,
            CoercedRhs::Owned(b) => b.as_ref(),
        }
    }
}

impl Clone for Variable {
    fn clone(&self) -> Self {
        match (&self.storage, self.clone_fn) {
            (Some(s), Some(f)) => Variable { storage: Some(f(s.as_ref())), type_info: self.type_info, clone_fn: self.clone_fn },
            _ => Variable::empty(),
        }
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.type_info {
            Some(t) => write!(f, "Variable<{t}>"),
            None => write!(f, "Variable<empty>"),
        }
    }
}
