//! Registry error taxonomy.
//!
//! Errors are classified by [`ErrorKind`]: each kind carries a
//! process-lifetime unique ID, an HTTP-like status code, a [`Reason`] tag,
//! and a message template with `${name}` placeholders. A concrete
//! [`RegistryError`] is produced by substituting a data map into the
//! template. Equality is by kind identity, never by message text, so callers
//! can branch on kind without string matching.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::LazyLock;

use serde::Serialize;

/// Reason classes carried by every error kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Reason {
    /// The request itself is malformed or names something invalid.
    #[serde(rename = "ReasonRequest")]
    Request,
    /// The registry failed internally or holds conflicting state.
    #[serde(rename = "ReasonInternal")]
    Internal,
    /// A resource lock could not be acquired or a write is in flight.
    #[serde(rename = "ResourceLocking")]
    Locking,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reason::Request => "ReasonRequest",
            Reason::Internal => "ReasonInternal",
            Reason::Locking => "ResourceLocking",
        }
    }
}

/// Data map substituted into message templates and echoed in responses.
pub type ErrorData = BTreeMap<String, String>;

// Kind IDs are handed out once per process; equality of errors reduces to
// comparing these.
static KIND_COUNTER: AtomicU32 = AtomicU32::new(0);

fn next_kind_id() -> u32 {
    KIND_COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

/// A classified error kind: status code, reason tag, and message template.
///
/// Kinds are declared as statics below; two errors are equal iff they were
/// produced from the same kind.
#[derive(Debug)]
pub struct ErrorKind {
    id: u32,
    code: u16,
    reason: Reason,
    template: &'static str,
}

impl ErrorKind {
    fn new(code: u16, reason: Reason, template: &'static str) -> Self {
        Self {
            id: next_kind_id(),
            code,
            reason,
            template,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// Instantiate this kind with a data map. Each `${key}` placeholder in
    /// the template is replaced by the mapped value.
    pub fn with<const N: usize>(&self, pairs: [(&str, String); N]) -> RegistryError {
        let data: ErrorData = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let mut message = self.template.to_string();
        for (key, value) in &data {
            message = message.replace(&format!("${{{key}}}"), value);
        }
        RegistryError {
            id: self.id,
            code: self.code,
            reason: self.reason,
            message,
            detail: String::new(),
            data,
        }
    }

    /// Wrap an underlying failure, preserving its text in the detail field.
    pub fn wrap(&self, source: impl fmt::Display) -> RegistryError {
        let detail = source.to_string();
        let mut err = self.with([("detail", detail.clone())]);
        err.detail = detail;
        err
    }
}

/// A concrete registry error.
///
/// Serialized as the HTTP error body. Equality compares the kind ID only.
#[derive(Clone, Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct RegistryError {
    pub id: u32,
    pub code: u16,
    pub reason: Reason,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub detail: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: ErrorData,
}

impl RegistryError {
    /// Returns `true` if this error was produced from `kind`.
    pub fn is(&self, kind: &ErrorKind) -> bool {
        self.id == kind.id
    }
}

impl PartialEq for RegistryError {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for RegistryError {}

/// Result alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

pub static ERROR_PARAM_NOT_FOUND: LazyLock<ErrorKind> = LazyLock::new(|| {
    ErrorKind::new(400, Reason::Request, "can't find param ${name} in request")
});

pub static ERROR_PARAM_TYPE: LazyLock<ErrorKind> = LazyLock::new(|| {
    ErrorKind::new(
        400,
        Reason::Request,
        "param ${name} should be ${expected}, but got ${actual}",
    )
});

pub static ERROR_PARAM_VALUE: LazyLock<ErrorKind> = LazyLock::new(|| {
    ErrorKind::new(
        400,
        Reason::Request,
        "param ${name} has invalid value: ${value}",
    )
});

pub static ERROR_INVALID_PARAM: LazyLock<ErrorKind> =
    LazyLock::new(|| ErrorKind::new(400, Reason::Request, "${name} is invalid: ${value}"));

pub static ERROR_CONTENT_NOT_FOUND: LazyLock<ErrorKind> =
    LazyLock::new(|| ErrorKind::new(404, Reason::Internal, "content ${name} not found"));

pub static ERROR_RESOURCE_EXIST: LazyLock<ErrorKind> = LazyLock::new(|| {
    ErrorKind::new(409, Reason::Internal, "resource conflict because ${name} exist")
});

pub static ERROR_LOCKED: LazyLock<ErrorKind> = LazyLock::new(|| {
    ErrorKind::new(
        423,
        Reason::Locking,
        "${kind} is locking and can't be handled: ${name}",
    )
});

pub static ERROR_INVALID_STATUS: LazyLock<ErrorKind> = LazyLock::new(|| {
    ErrorKind::new(409, Reason::Internal, "${name} status is invalid: ${status}")
});

pub static ERROR_INTERNAL_TYPE: LazyLock<ErrorKind> = LazyLock::new(|| {
    ErrorKind::new(
        500,
        Reason::Internal,
        "type of ${name} should be ${expected}, but got ${actual}",
    )
});

pub static ERROR_UNKNOWN_NOT_FOUND: LazyLock<ErrorKind> = LazyLock::new(|| {
    ErrorKind::new(
        500,
        Reason::Internal,
        "content ${name} not found, may be it's a serious error",
    )
});

pub static ERROR_INTERNAL_UNKNOWN: LazyLock<ErrorKind> =
    LazyLock::new(|| ErrorKind::new(500, Reason::Internal, "${detail}"));
