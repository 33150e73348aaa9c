//! Translation core: decision model, backend seam, response cache, and the
//! per-query resolver.

pub mod backend;
pub mod cache;
pub mod resolver;
pub mod sqlite_cache;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::Settings;

/// Why a query was declined without a backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WaitingReason {
    /// Nothing typed yet.
    Empty,
    /// Input present but not a complete-enough unit to translate.
    StillTyping,
}

/// Failure categories surfaced to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    /// No API credential configured; no backend call was attempted.
    ConfigMissing,
    /// Network-level failure reaching the backend (DNS, refused, timeout).
    Transport,
    /// Backend reachable but returned a non-success HTTP status.
    Protocol,
    /// Backend returned success but the body lacks the translation field.
    Shape,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::ConfigMissing => write!(f, "config missing"),
            FailureKind::Transport => write!(f, "transport error"),
            FailureKind::Protocol => write!(f, "protocol error"),
            FailureKind::Shape => write!(f, "shape error"),
        }
    }
}

/// Per-query outcome returned to the host. Transient, never stored.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Not ready to translate; the host renders a placeholder.
    Waiting(WaitingReason),
    /// A translation, either fresh from the backend or replayed from cache.
    Translated { text: String, from_cache: bool },
    /// The query failed; `message` is human-readable.
    Failed { kind: FailureKind, message: String },
}

/// Errors from the chat-completions backend.
#[derive(Debug)]
pub enum BackendError {
    Transport(String),
    Protocol { status: u16, detail: String },
    Shape(String),
}

impl BackendError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BackendError::Transport(_) => FailureKind::Transport,
            BackendError::Protocol { .. } => FailureKind::Protocol,
            BackendError::Shape(_) => FailureKind::Shape,
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Transport(msg) => write!(f, "network error: {msg}"),
            BackendError::Protocol { status, detail } => {
                write!(f, "API error ({status}): {detail}")
            }
            BackendError::Shape(msg) => write!(f, "unexpected response shape: {msg}"),
        }
    }
}

/// Backend seam: anything that can turn source text into a translation.
/// The production implementation is [`backend::ChatClient`]; tests inject
/// call-counting stubs.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn translate(&self, text: &str, settings: &Settings) -> Result<String, BackendError>;
}
