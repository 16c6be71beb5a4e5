//! Runtime metaobject and object-extension framework: metaclasses, a
//! type-erased `Variable`, object extensions, and a reentrancy-safe
//! signal/slot system built entirely on top of them.
//!
//! `library` is the entry point for embedders: call
//! [`library::Library::initialize`] before constructing objects through
//! [`factory::ObjectFactory`].

pub mod arguments;
pub mod cache;
pub mod connection;
pub mod container;
pub mod error;
pub mod extension;
pub mod factory;
pub mod invokable;
pub mod library;
pub mod meta_name;
pub mod metaclass;
pub mod object;
pub mod signal;
pub mod thread_pool;
pub mod tracer;
pub mod type_info;
pub mod type_registry;
pub mod variable;

pub use arguments::PackagedArguments;
pub use connection::Connection;
pub use error::{MetaError, MetaResult};
pub use extension::{ExtensionCore, ObjectExtension};
pub use factory::ObjectFactory;
pub use library::{Library, LibraryConfig};
pub use metaclass::{ClassKind, MetaClass};
pub use object::{MetaObject, Object};
pub use signal::{Signal, SignalExtension};
pub use type_info::TypeInfo;
pub use variable::Variable;
