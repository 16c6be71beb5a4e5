//! `Tracer`, `TraceRecord`, `LogLevel` (§10).
//!
//! Grounded on the teacher's `runtime::registry::ExtensionRegistry`, which
//! routes every lifecycle-hook failure through `eprintln!("Warning: ...")`
//! at a handful of call sites rather than letting each extension print for
//! itself. This generalizes that single path into a trait object so an
//! embedder can install a different sink, and adds the filterable severity
//! level the teacher's unconditional `eprintln!` has no concept of.

use std::fmt;

/// Severity of a `TraceRecord`, ordered least to most verbose. `Suppressed`
/// is a filter setting only — no record is ever produced at that level.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum LogLevel {
    Suppressed,
    Fatal,
    Error,
    Warning,
    Info,
    Debug,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Suppressed => "SUPPRESSED",
            LogLevel::Fatal => "FATAL",
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        };
        f.write_str(s)
    }
}

/// One diagnostic record produced at the points §10 calls out: extension
/// attach failures, `invoke`/`run` catching user-code errors, and
/// precondition violations logged just before they panic.
#[derive(Clone, Debug)]
pub struct TraceRecord {
    pub level: LogLevel,
    pub target: String,
    pub message: String,
}

/// The one seam every side-effecting diagnostic in the core goes through.
pub trait Tracer {
    fn trace(&self, record: &TraceRecord);
}

/// Default `Tracer`: writes `[LEVEL] target: message` to stderr for any
/// record whose level passes the configured filter — the same
/// `Warning: Extension '...' failed: ...` shape the teacher prints
/// unconditionally, but filterable.
pub struct StderrTracer {
    filter: LogLevel,
}

impl StderrTracer {
    pub fn new(filter: LogLevel) -> Self {
        Self { filter }
    }
}

impl Tracer for StderrTracer {
    fn trace(&self, record: &TraceRecord) {
        if record.level > self.filter {
            return;
        }
        eprintln!("[{}] {}: {}", record.level, record.target, record.message);
    }
}
