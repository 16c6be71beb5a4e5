//! `Library`: process-wide initialization handle (§6, §11).
//!
//! Grounded on the teacher's `runtime::context::EngineContext::new()`, which
//! constructs the extension registry and registers built-in extensions in a
//! fixed order at startup; `Library::initialize` does the equivalent for
//! this crate's base metaclasses, plus the tracer/thread-pool collaborators
//! §12 carries ambient.

use std::cell::RefCell;

use crate::factory::ObjectFactory;
use crate::metaclass::{ClassKind, MetaClass};
use crate::thread_pool::{Job, ThreadPool};
use crate::tracer::{LogLevel, StderrTracer, TraceRecord, Tracer};

/// `thread_pool.create` / `thread_pool.thread_count` from §6.
#[derive(Clone, Debug, Default)]
pub struct ThreadPoolConfig {
    pub create: bool,
    pub thread_count: Option<usize>,
}

/// `tracer.log_level` from §6.
#[derive(Clone, Debug)]
pub struct TracerConfig {
    pub log_level: LogLevel,
}

impl Default for TracerConfig {
    fn default() -> Self {
        Self { log_level: LogLevel::Warning }
    }
}

/// The configuration record `Library::initialize` consumes exactly once
/// (§11) — no file or environment parsing happens in the core.
#[derive(Clone, Debug, Default)]
pub struct LibraryConfig {
    pub thread_pool: ThreadPoolConfig,
    pub tracer: TracerConfig,
}

struct State {
    tracer: Box<dyn Tracer>,
    thread_pool: Option<ThreadPool>,
}

impl Default for State {
    fn default() -> Self {
        Self { tracer: Box::new(StderrTracer::new(LogLevel::Warning)), thread_pool: None }
    }
}

thread_local! {
    // Not `Rc`-based, but kept `thread_local` to match every other
    // process-wide service in this crate (`ObjectFactory`, `TypeRegistry`'s
    // lazily-installed builtins) and because a custom `Tracer` an embedder
    // installs has no reason to be required `Send + Sync`.
    static STATE: RefCell<State> = RefCell::new(State::default());
}

/// Base metaclass names registered by `initialize` (§6).
pub const OBJECT_METACLASS: &str = "Object";
pub const OBJECT_EXTENSION_METACLASS: &str = "ObjectExtension";

/// Process-wide (per-thread, see above) initialization handle.
pub struct Library;

impl Library {
    /// Constructs the tracer, optionally the thread pool, and registers the
    /// base metaclasses (`Object`, `ObjectExtension`) with the
    /// `ObjectFactory`.
    pub fn initialize(config: LibraryConfig) {
        let thread_pool = if config.thread_pool.create {
            let thread_count = config.thread_pool.thread_count.unwrap_or_else(|| {
                std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
            });
            Some(ThreadPool::new(thread_count))
        } else {
            None
        };

        STATE.with(|state| {
            *state.borrow_mut() = State { tracer: Box::new(StderrTracer::new(config.tracer.log_level)), thread_pool };
        });

        ObjectFactory::register(MetaClass::builder(OBJECT_EXTENSION_METACLASS, ClassKind::Abstract).seal());
        ObjectFactory::register(MetaClass::builder(OBJECT_METACLASS, ClassKind::Concrete).seal());
    }

    /// Tears down the thread pool (joining its workers) and resets the
    /// tracer to its default. Does not clear `ObjectFactory` registrations —
    /// nothing in §6 asks for that, and the factory's own registry has no
    /// "reset" operation.
    pub fn uninitialize() {
        STATE.with(|state| {
            let mut state = state.borrow_mut();
            if let Some(mut pool) = state.thread_pool.take() {
                pool.stop();
            }
            state.tracer = Box::new(StderrTracer::new(LogLevel::Warning));
        });
    }

    /// Installs a custom `Tracer`, replacing whatever `initialize` set up.
    pub fn set_tracer(tracer: Box<dyn Tracer>) {
        STATE.with(|state| state.borrow_mut().tracer = tracer);
    }

    /// Schedules `job` on the thread pool if one was created; runs it
    /// inline otherwise, so callers don't need to branch on configuration.
    pub fn schedule(job: Job) {
        STATE.with(|state| match &state.borrow().thread_pool {
            Some(pool) => pool.push(job),
            None => job(),
        });
    }

    pub fn trace(level: LogLevel, target: &str, message: &str) {
        STATE.with(|state| {
            state.borrow().tracer.trace(&TraceRecord { level, target: target.to_string(), message: message.to_string() })
        });
    }

    /// Convenience used at every logged-failure point in this crate
    /// (extension-attach failures, `run` catching a raised error,
    /// factory-driven extension attachment) — all of them log at `Error`
    /// under the `"core"` target.
    pub fn trace_error(message: &str) {
        Self::trace(LogLevel::Error, "core", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell as StdRefCell;
    use std::rc::Rc;

    struct RecordingTracer {
        records: Rc<StdRefCell<Vec<TraceRecord>>>,
    }

    impl Tracer for RecordingTracer {
        fn trace(&self, record: &TraceRecord) {
            self.records.borrow_mut().push(record.clone());
        }
    }

    #[test]
    fn trace_error_reaches_installed_tracer() {
        let records = Rc::new(StdRefCell::new(Vec::new()));
        Library::set_tracer(Box::new(RecordingTracer { records: records.clone() }));
        Library::trace_error("boom");
        assert_eq!(records.borrow().len(), 1);
        assert_eq!(records.borrow()[0].message, "boom");
        Library::uninitialize();
    }

    #[test]
    fn initialize_registers_base_metaclasses() {
        Library::initialize(LibraryConfig::default());
        assert!(ObjectFactory::find(OBJECT_METACLASS).is_some());
        assert!(ObjectFactory::find(OBJECT_EXTENSION_METACLASS).is_some());
        Library::uninitialize();
    }

    #[test]
    fn schedule_without_a_pool_runs_inline() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;
        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();
        Library::schedule(Box::new(move || ran_clone.store(true, Ordering::SeqCst)));
        assert!(ran.load(Ordering::SeqCst));
    }
}
