//! Process-wide registry of operator vtables and pairwise converters (§4.1).
//!
//! Grounded on the teacher's `runtime::resource_manager::ResourceManager`
//! (`TypeId`-keyed, downcast-on-access storage) generalized from a per-request
//! resource map into a lazily-initialized, process-wide, append-only registry
//! — the same `TypeId -> Box<dyn Any>`-shaped lookup, but populated once at
//! first use and read afterward, per §5's concurrency rules for `TypeRegistry`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::MetaError;
use crate::type_info::TypeInfo;

pub type UnaryOp = fn(&dyn Any) -> Box<dyn Any>;
pub type BinaryOp = fn(&dyn Any, &dyn Any) -> Box<dyn Any>;
pub type ShiftOp = fn(&dyn Any, usize) -> Box<dyn Any>;
pub type CompareOp = fn(&dyn Any, &dyn Any) -> bool;
pub type ConvertFn = fn(&dyn Any) -> Result<Box<dyn Any>, String>;
/// `operator->()`: a mutable raw pointer into the stored value, type-erased.
pub type PtrOp = fn(&mut dyn Any) -> *mut ();
/// `operator->() const`: a const raw pointer into the stored value.
pub type CPtrOp = fn(&dyn Any) -> *const ();

/// Operator vtable for one registered type (§3 TypeOperators). Any field may
/// be `None`, meaning "unsupported" for that type.
#[derive(Default)]
pub struct TypeOperators {
    pub add: Option<BinaryOp>,
    pub sub: Option<BinaryOp>,
    pub mul: Option<BinaryOp>,
    pub div: Option<BinaryOp>,
    pub bw_and: Option<BinaryOp>,
    pub bw_or: Option<BinaryOp>,
    pub bw_xor: Option<BinaryOp>,
    pub bw_not: Option<UnaryOp>,
    pub bw_shl: Option<ShiftOp>,
    pub bw_shr: Option<ShiftOp>,
    pub land: Option<BinaryOp>,
    pub lor: Option<BinaryOp>,
    pub lnot: Option<UnaryOp>,
    pub eq: Option<CompareOp>,
    pub less: Option<CompareOp>,
    pub leq: Option<CompareOp>,
    pub gt: Option<CompareOp>,
    pub geq: Option<CompareOp>,
    pub ptr: Option<PtrOp>,
    pub cptr: Option<CPtrOp>,
}

/// Generic `ptr` slot body for a type registered as `T`: downcasts and takes
/// a type-erased pointer to the field in place.
fn ptr_of<T: 'static>(a: &mut dyn Any) -> *mut () {
    a.downcast_mut::<T>().expect("ptr: storage type mismatch") as *mut T as *mut ()
}

/// Generic `cptr` slot body for a type registered as `T`.
fn cptr_of<T: 'static>(a: &dyn Any) -> *const () {
    a.downcast_ref::<T>().expect("cptr: storage type mismatch") as *const T as *const ()
}

/// A single (source, target) converter (§3 TypeConverter).
pub struct TypeConverter {
    pub target: TypeInfo,
    pub convert: ConvertFn,
}

#[derive(Default)]
struct Registry {
    operators: HashMap<TypeId, &'static TypeOperators>,
    converters: HashMap<(TypeId, TypeId), &'static TypeConverter>,
    builtins_installed: bool,
}

lazy_static::lazy_static! {
    static ref REGISTRY: Mutex<Registry> = Mutex::new(Registry::default());
}

/// Process-wide mapping `TypeInfo -> TypeOperators` and pairwise converters.
pub struct TypeRegistry;

impl TypeRegistry {
    /// Registers the operator vtable for `info`.
    ///
    /// # Panics
    /// Panics if `info` is already registered — registering a duplicate type
    /// is a fatal precondition violation (§4.1), matching the rest of the
    /// crate's precondition-violation-aborts-the-process policy (§7).
    pub fn register_operators(info: TypeInfo, ops: TypeOperators) {
        let mut reg = REGISTRY.lock().unwrap();
        let leaked: &'static TypeOperators = Box::leak(Box::new(ops));
        if reg.operators.insert(info.raw_id(), leaked).is_some() {
            panic!("TypeRegistry: type {info} is already registered");
        }
    }

    /// Registers a converter from `source` to `target`.
    ///
    /// # Panics
    /// Panics on a duplicate (source, target) pair (§4.1).
    pub fn register_converter(source: TypeInfo, target: TypeInfo, convert: ConvertFn) {
        let mut reg = REGISTRY.lock().unwrap();
        let leaked: &'static TypeConverter = Box::leak(Box::new(TypeConverter { target, convert }));
        if reg.converters.insert((source.raw_id(), target.raw_id()), leaked).is_some() {
            panic!("TypeRegistry: converter {source} -> {target} is already registered");
        }
    }

    fn ensure_builtins() {
        let already = REGISTRY.lock().unwrap().builtins_installed;
        if !already {
            install_builtins();
            REGISTRY.lock().unwrap().builtins_installed = true;
        }
    }

    /// Looks up the operator vtable for `info`, or `None` if unregistered.
    pub fn operators(info: TypeInfo) -> Option<&'static TypeOperators> {
        Self::ensure_builtins();
        REGISTRY.lock().unwrap().operators.get(&info.raw_id()).copied()
    }

    /// Looks up the (source, target) converter, or `None` if unregistered.
    pub fn converter(source: TypeInfo, target: TypeInfo) -> Option<&'static TypeConverter> {
        Self::ensure_builtins();
        REGISTRY.lock().unwrap().converters.get(&(source.raw_id(), target.raw_id())).copied()
    }

    /// Converts an erased value of type `source` to `target`.
    ///
    /// Converting a type to itself is identity and never consults the
    /// registry (§3 invariant).
    pub fn convert(value: &dyn Any, source: TypeInfo, target: TypeInfo) -> Result<Box<dyn Any>, MetaError> {
        if source == target {
            panic!("TypeRegistry::convert called with source == target; callers must special-case identity");
        }
        let converter = Self::converter(source, target).ok_or(MetaError::InvalidConverter { from: source, to: target })?;
        (converter.convert)(value).map_err(|_| MetaError::ConversionException { from: source, to: target })
    }
}

macro_rules! numeric_pair {
    ($from:ty, $to:ty) => {
        TypeRegistry::register_converter(
            TypeInfo::of::<$from>(),
            TypeInfo::of::<$to>(),
            |v: &dyn Any| {
                let val = *v.downcast_ref::<$from>().expect("converter: source type mismatch");
                Ok(Box::new(val as $to) as Box<dyn Any>)
            },
        );
    };
}

macro_rules! numeric_matrix {
    ([$($t:ty),+ $(,)?]) => {
        numeric_matrix!(@outer [$($t),+]; [$($t),+]);
    };
    (@outer [$($from:ty),+]; $all:tt) => {
        $( numeric_matrix!(@inner $from; $all); )+
    };
    (@inner $from:ty; [$($to:ty),+]) => {
        $(
            if TypeInfo::of::<$from>() != TypeInfo::of::<$to>() {
                numeric_pair!($from, $to);
            }
        )+
    };
}

macro_rules! to_string_converter {
    ($from:ty) => {
        TypeRegistry::register_converter(TypeInfo::of::<$from>(), TypeInfo::of::<String>(), |v: &dyn Any| {
            let val = v.downcast_ref::<$from>().expect("converter: source type mismatch");
            Ok(Box::new(val.to_string()) as Box<dyn Any>)
        });
    };
}

macro_rules! from_string_converter {
    ($to:ty) => {
        TypeRegistry::register_converter(TypeInfo::of::<String>(), TypeInfo::of::<$to>(), |v: &dyn Any| {
            let val = v.downcast_ref::<String>().expect("converter: source type mismatch");
            val.trim().parse::<$to>().map(|p| Box::new(p) as Box<dyn Any>).map_err(|e| e.to_string())
        });
    };
}

fn install_builtins() {
    numeric_matrix!([i8, i16, i32, i64, u8, u16, u32, u64, f32, f64]);

    to_string_converter!(i8);
    to_string_converter!(i16);
    to_string_converter!(i32);
    to_string_converter!(i64);
    to_string_converter!(u8);
    to_string_converter!(u16);
    to_string_converter!(u32);
    to_string_converter!(u64);
    to_string_converter!(f32);
    to_string_converter!(f64);
    to_string_converter!(bool);

    from_string_converter!(i8);
    from_string_converter!(i16);
    from_string_converter!(i32);
    from_string_converter!(i64);
    from_string_converter!(u8);
    from_string_converter!(u16);
    from_string_converter!(u32);
    from_string_converter!(u64);
    from_string_converter!(f32);
    from_string_converter!(f64);

    TypeRegistry::register_converter(TypeInfo::of::<String>(), TypeInfo::of::<bool>(), |v: &dyn Any| {
        let s = v.downcast_ref::<String>().expect("converter: source type mismatch");
        match s.trim() {
            "1" | "true" => Ok(Box::new(true) as Box<dyn Any>),
            "0" | "false" | "" => Ok(Box::new(false) as Box<dyn Any>),
            other => Err(format!("'{other}' is not a valid boolean literal")),
        }
    });

    macro_rules! bool_to_numeric {
        ($to:ty) => {
            TypeRegistry::register_converter(TypeInfo::of::<bool>(), TypeInfo::of::<$to>(), |v: &dyn Any| {
                let b = *v.downcast_ref::<bool>().expect("converter: source type mismatch");
                Ok(Box::new(if b { 1 as $to } else { 0 as $to }) as Box<dyn Any>)
            });
        };
    }
    macro_rules! numeric_to_bool {
        ($from:ty) => {
            TypeRegistry::register_converter(TypeInfo::of::<$from>(), TypeInfo::of::<bool>(), |v: &dyn Any| {
                let val = *v.downcast_ref::<$from>().expect("converter: source type mismatch");
                Ok(Box::new(val != 0 as $from) as Box<dyn Any>)
            });
        };
    }
    bool_to_numeric!(i8);
    bool_to_numeric!(i16);
    bool_to_numeric!(i32);
    bool_to_numeric!(i64);
    bool_to_numeric!(u8);
    bool_to_numeric!(u16);
    bool_to_numeric!(u32);
    bool_to_numeric!(u64);
    bool_to_numeric!(f32);
    bool_to_numeric!(f64);
    numeric_to_bool!(i8);
    numeric_to_bool!(i16);
    numeric_to_bool!(i32);
    numeric_to_bool!(i64);
    numeric_to_bool!(u8);
    numeric_to_bool!(u16);
    numeric_to_bool!(u32);
    numeric_to_bool!(u64);

    macro_rules! register_ops {
        ($ty:ty, arith) => {
            TypeRegistry::register_operators(
                TypeInfo::of::<$ty>(),
                TypeOperators {
                    add: Some(|a, b| Box::new(downcast::<$ty>(a) + downcast::<$ty>(b))),
                    sub: Some(|a, b| Box::new(downcast::<$ty>(a) - downcast::<$ty>(b))),
                    mul: Some(|a, b| Box::new(downcast::<$ty>(a) * downcast::<$ty>(b))),
                    div: Some(|a, b| Box::new(downcast::<$ty>(a) / downcast::<$ty>(b))),
                    eq: Some(|a, b| downcast::<$ty>(a) == downcast::<$ty>(b)),
                    less: Some(|a, b| downcast::<$ty>(a) < downcast::<$ty>(b)),
                    leq: Some(|a, b| downcast::<$ty>(a) <= downcast::<$ty>(b)),
                    gt: Some(|a, b| downcast::<$ty>(a) > downcast::<$ty>(b)),
                    geq: Some(|a, b| downcast::<$ty>(a) >= downcast::<$ty>(b)),
                    ptr: Some(ptr_of::<$ty>),
                    cptr: Some(cptr_of::<$ty>),
                    ..Default::default()
                },
            );
        };
    }
    macro_rules! register_int_ops {
        ($ty:ty) => {
            TypeRegistry::register_operators(
                TypeInfo::of::<$ty>(),
                TypeOperators {
                    add: Some(|a, b| Box::new(downcast::<$ty>(a) + downcast::<$ty>(b))),
                    sub: Some(|a, b| Box::new(downcast::<$ty>(a) - downcast::<$ty>(b))),
                    mul: Some(|a, b| Box::new(downcast::<$ty>(a) * downcast::<$ty>(b))),
                    div: Some(|a, b| Box::new(downcast::<$ty>(a) / downcast::<$ty>(b))),
                    bw_and: Some(|a, b| Box::new(downcast::<$ty>(a) & downcast::<$ty>(b))),
                    bw_or: Some(|a, b| Box::new(downcast::<$ty>(a) | downcast::<$ty>(b))),
                    bw_xor: Some(|a, b| Box::new(downcast::<$ty>(a) ^ downcast::<$ty>(b))),
                    bw_not: Some(|a| Box::new(!downcast::<$ty>(a))),
                    bw_shl: Some(|a, n| Box::new(downcast::<$ty>(a) << n)),
                    bw_shr: Some(|a, n| Box::new(downcast::<$ty>(a) >> n)),
                    eq: Some(|a, b| downcast::<$ty>(a) == downcast::<$ty>(b)),
                    less: Some(|a, b| downcast::<$ty>(a) < downcast::<$ty>(b)),
                    leq: Some(|a, b| downcast::<$ty>(a) <= downcast::<$ty>(b)),
                    gt: Some(|a, b| downcast::<$ty>(a) > downcast::<$ty>(b)),
                    geq: Some(|a, b| downcast::<$ty>(a) >= downcast::<$ty>(b)),
                    ptr: Some(ptr_of::<$ty>),
                    cptr: Some(cptr_of::<$ty>),
                    ..Default::default()
                },
            );
        };
    }

    fn downcast<T: Copy + 'static>(v: &dyn Any) -> T {
        *v.downcast_ref::<T>().expect("operator: storage type mismatch")
    }

    register_int_ops!(i8);
    register_int_ops!(i16);
    register_int_ops!(i32);
    register_int_ops!(i64);
    register_int_ops!(u8);
    register_int_ops!(u16);
    register_int_ops!(u32);
    register_int_ops!(u64);
    register_ops!(f32, arith);
    register_ops!(f64, arith);

    TypeRegistry::register_operators(
        TypeInfo::of::<bool>(),
        TypeOperators {
            land: Some(|a, b| Box::new(downcast::<bool>(a) && downcast::<bool>(b))),
            lor: Some(|a, b| Box::new(downcast::<bool>(a) || downcast::<bool>(b))),
            lnot: Some(|a| Box::new(!downcast::<bool>(a))),
            eq: Some(|a, b| downcast::<bool>(a) == downcast::<bool>(b)),
            ptr: Some(ptr_of::<bool>),
            cptr: Some(cptr_of::<bool>),
            ..Default::default()
        },
    );

    TypeRegistry::register_operators(
        TypeInfo::of::<String>(),
        TypeOperators {
            add: Some(|a, b| {
                let a = a.downcast_ref::<String>().expect("operator: storage type mismatch");
                let b = b.downcast_ref::<String>().expect("operator: storage type mismatch");
                Box::new(format!("{a}{b}"))
            }),
            eq: Some(|a, b| {
                a.downcast_ref::<String>().expect("operator: storage type mismatch")
                    == b.downcast_ref::<String>().expect("operator: storage type mismatch")
            }),
            less: Some(|a, b| {
                a.downcast_ref::<String>().expect("operator: storage type mismatch")
                    < b.downcast_ref::<String>().expect("operator: storage type mismatch")
            }),
            ptr: Some(ptr_of::<String>),
            cptr: Some(cptr_of::<String>),
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_int_operators_are_registered() {
        let ops = TypeRegistry::operators(TypeInfo::of::<i64>()).expect("i64 should be registered");
        assert!(ops.add.is_some());
        assert!(ops.bw_shl.is_some());
    }

    #[test]
    fn unregistered_type_has_no_operators() {
        struct Unregistered;
        assert!(TypeRegistry::operators(TypeInfo::of::<Unregistered>()).is_none());
    }

    #[test]
    fn numeric_roundtrip_i64_f64() {
        let source = TypeInfo::of::<i64>();
        let target = TypeInfo::of::<f64>();
        let v: i64 = 42;
        let as_f64 = TypeRegistry::convert(&v, source, target).unwrap();
        let back = TypeRegistry::convert(&*as_f64, target, source).unwrap();
        assert_eq!(*back.downcast_ref::<i64>().unwrap(), 42);
    }

    #[test]
    fn string_roundtrip() {
        let source = TypeInfo::of::<i64>();
        let target = TypeInfo::of::<String>();
        let v: i64 = -7;
        let as_string = TypeRegistry::convert(&v, source, target).unwrap();
        assert_eq!(*as_string.downcast_ref::<String>().unwrap(), "-7");
        let back = TypeRegistry::convert(&*as_string, target, source).unwrap();
        assert_eq!(*back.downcast_ref::<i64>().unwrap(), -7);
    }

    #[test]
    fn malformed_string_conversion_fails() {
        let source = TypeInfo::of::<String>();
        let target = TypeInfo::of::<i64>();
        let v = "not a number".to_string();
        assert!(TypeRegistry::convert(&v, source, target).is_err());
    }

    #[test]
    fn unknown_pair_has_no_converter() {
        struct Unregistered;
        assert!(TypeRegistry::converter(TypeInfo::of::<Unregistered>(), TypeInfo::of::<i64>()).is_none());
    }

    #[test]
    fn ptr_and_cptr_slots_round_trip_through_the_stored_value() {
        let ops = TypeRegistry::operators(TypeInfo::of::<i64>()).expect("i64 should be registered");
        let mut v: i64 = 42;
        let any: &mut dyn Any = &mut v;
        let raw = (ops.ptr.unwrap())(any);
        unsafe {
            *(raw as *mut i64) = 7;
        }
        assert_eq!(v, 7);

        let ro: &dyn Any = &v;
        let craw = (ops.cptr.unwrap())(ro);
        assert_eq!(unsafe { *(craw as *const i64) }, 7);
    }
}
