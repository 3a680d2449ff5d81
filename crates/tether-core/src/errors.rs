//! Error codes carried by `error` replies.
//!
//! A code maps to a symbolic name and a *definite* flag. A definite error
//! means the requested operation certainly did not take effect; an
//! indefinite one (such as a timeout) means it may or may not have.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// One entry in the error table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorSpec {
    pub code: i64,
    pub name: Cow<'static, str>,
    pub definite: bool,
}

impl ErrorSpec {
    pub const fn new(code: i64, name: &'static str, definite: bool) -> Self {
        Self {
            code,
            name: Cow::Borrowed(name),
            definite,
        }
    }

    /// The entry reported for codes missing from the table.
    pub fn unknown(code: i64) -> Self {
        Self {
            code,
            name: Cow::Borrowed(UNKNOWN),
            definite: false,
        }
    }
}

/// Name given to unregistered codes.
pub const UNKNOWN: &str = "unknown";

pub const TIMEOUT: ErrorSpec = ErrorSpec::new(0, "timeout", false);
pub const NODE_NOT_FOUND: ErrorSpec = ErrorSpec::new(1, "node-not-found", true);
pub const NOT_SUPPORTED: ErrorSpec = ErrorSpec::new(10, "not-supported", true);
pub const TEMPORARILY_UNAVAILABLE: ErrorSpec = ErrorSpec::new(11, "temporarily-unavailable", true);

pub const MALFORMED_REQUEST: ErrorSpec = ErrorSpec::new(12, "malformed-request", true);
pub const CRASH: ErrorSpec = ErrorSpec::new(13, "crash", false);
pub const ABORT: ErrorSpec = ErrorSpec::new(14, "abort", true);
pub const KEY_DOES_NOT_EXIST: ErrorSpec = ErrorSpec::new(20, "key-does-not-exist", true);
pub const KEY_ALREADY_EXISTS: ErrorSpec = ErrorSpec::new(21, "key-already-exists", true);
pub const PRECONDITION_FAILED: ErrorSpec = ErrorSpec::new(22, "precondition-failed", true);
pub const TXN_CONFLICT: ErrorSpec = ErrorSpec::new(30, "txn-conflict", true);

/// Codes every client understands.
pub const COMMON: [ErrorSpec; 4] = [TIMEOUT, NODE_NOT_FOUND, NOT_SUPPORTED, TEMPORARILY_UNAVAILABLE];

/// Workload-level codes that callers may opt into.
pub const WORKLOAD: [ErrorSpec; 7] = [
    MALFORMED_REQUEST,
    CRASH,
    ABORT,
    KEY_DOES_NOT_EXIST,
    KEY_ALREADY_EXISTS,
    PRECONDITION_FAILED,
    TXN_CONFLICT,
];

/// A table from numeric code to [`ErrorSpec`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorRegistry {
    by_code: BTreeMap<i64, ErrorSpec>,
}

impl ErrorRegistry {
    /// The standard table: timeout, node-not-found, not-supported and
    /// temporarily-unavailable.
    pub fn common() -> Self {
        let mut registry = Self::default();
        registry.extend(COMMON);
        registry
    }

    /// The standard table plus the workload codes.
    pub fn extended() -> Self {
        let mut registry = Self::common();
        registry.extend(WORKLOAD);
        registry
    }

    /// A copy of this table with `overrides` applied; overrides win on
    /// code collisions.
    pub fn merged(&self, overrides: impl IntoIterator<Item = ErrorSpec>) -> Self {
        let mut registry = self.clone();
        registry.extend(overrides);
        registry
    }

    /// Add or replace one entry.
    pub fn define(&mut self, spec: ErrorSpec) {
        self.by_code.insert(spec.code, spec);
    }

    pub fn get(&self, code: i64) -> Option<&ErrorSpec> {
        self.by_code.get(&code)
    }

    /// Resolve a code, falling back to an indefinite `unknown` entry.
    pub fn classify(&self, code: i64) -> ErrorSpec {
        self.get(code)
            .cloned()
            .unwrap_or_else(|| ErrorSpec::unknown(code))
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }

    /// Entries in ascending code order.
    pub fn iter(&self) -> impl Iterator<Item = &ErrorSpec> {
        self.by_code.values()
    }
}

impl Extend<ErrorSpec> for ErrorRegistry {
    fn extend<T: IntoIterator<Item = ErrorSpec>>(&mut self, iter: T) {
        for spec in iter {
            self.define(spec);
        }
    }
}

impl FromIterator<ErrorSpec> for ErrorRegistry {
    fn from_iter<T: IntoIterator<Item = ErrorSpec>>(iter: T) -> Self {
        let mut registry = Self::default();
        registry.extend(iter);
        registry
    }
}
