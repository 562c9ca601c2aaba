//! Internal status codes and the client-facing error surface.
//!
//! `Status` is the internal error currency of the whole pipeline: parser,
//! validator, optimizer, executors and the scheduler all fail with it, and
//! the scheduler latches the first one observed. `ErrorCode` is the small
//! enumeration a client actually sees; `Status::error_code()` is the total
//! mapping between the two.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias used throughout the query pipeline.
pub type GraphResult<T> = Result<T, Status>;

/// Internal status codes.
///
/// The set mirrors every failure the storage, metadata and graph layers can
/// report back into the query service. Most of them collapse to a generic
/// execution error at the client boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Status {
    #[error("{0}")]
    Error(String),
    #[error("SyntaxError: {0}")]
    SyntaxError(String),
    #[error("Statement empty")]
    StatementEmpty,
    #[error("SemanticError: {0}")]
    SemanticError(String),
    #[error("PermissionError: {0}")]
    PermissionError(String),
    #[error("LeaderChanged: {0}")]
    LeaderChanged(String),
    #[error("EdgeNotFound: {0}")]
    EdgeNotFound(String),
    #[error("HostNotFound: {0}")]
    HostNotFound(String),
    #[error("IndexNotFound: {0}")]
    IndexNotFound(String),
    #[error("Inserted")]
    Inserted,
    #[error("KeyNotFound: {0}")]
    KeyNotFound(String),
    #[error("PartialSuccess: {0}")]
    PartialSuccess(String),
    #[error("NoSuchFile: {0}")]
    NoSuchFile(String),
    #[error("NotSupported: {0}")]
    NotSupported(String),
    #[error("PartNotFound: {0}")]
    PartNotFound(String),
    #[error("SpaceNotFound: {0}")]
    SpaceNotFound(String),
    #[error("GroupNotFound: {0}")]
    GroupNotFound(String),
    #[error("ZoneNotFound: {0}")]
    ZoneNotFound(String),
    #[error("TagNotFound: {0}")]
    TagNotFound(String),
    #[error("UserNotFound: {0}")]
    UserNotFound(String),
    #[error("ListenerNotFound: {0}")]
    ListenerNotFound(String),
    #[error("SessionNotFound: {0}")]
    SessionNotFound(String),
    #[error("Balanced")]
    Balanced,
}

impl Status {
    /// Generic execution error with a formatted message.
    pub fn error(msg: impl Into<String>) -> Self {
        Status::Error(msg.into())
    }

    pub fn syntax_error(msg: impl Into<String>) -> Self {
        Status::SyntaxError(msg.into())
    }

    pub fn semantic_error(msg: impl Into<String>) -> Self {
        Status::SemanticError(msg.into())
    }

    pub fn is_leader_changed(&self) -> bool {
        matches!(self, Status::LeaderChanged(_))
    }

    /// Map this internal status to the client error code.
    ///
    /// Every variant maps to exactly one code; anything that is not a
    /// syntax, statement-empty, semantic or permission failure is reported
    /// as a generic execution error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Status::SyntaxError(_) => ErrorCode::SyntaxError,
            Status::StatementEmpty => ErrorCode::StatementEmpty,
            Status::SemanticError(_) => ErrorCode::SemanticError,
            Status::PermissionError(_) => ErrorCode::BadPermission,
            Status::LeaderChanged(_)
            | Status::Balanced
            | Status::EdgeNotFound(_)
            | Status::Error(_)
            | Status::HostNotFound(_)
            | Status::IndexNotFound(_)
            | Status::Inserted
            | Status::KeyNotFound(_)
            | Status::PartialSuccess(_)
            | Status::NoSuchFile(_)
            | Status::NotSupported(_)
            | Status::PartNotFound(_)
            | Status::SpaceNotFound(_)
            | Status::GroupNotFound(_)
            | Status::ZoneNotFound(_)
            | Status::TagNotFound(_)
            | Status::UserNotFound(_)
            | Status::ListenerNotFound(_)
            | Status::SessionNotFound(_) => ErrorCode::ExecutionError,
        }
    }
}

/// Client-facing error codes.
///
/// Stable surface filled into `ExecutionResponse::error_code`; kept small on
/// purpose so clients never depend on internal failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "SUCCEEDED")]
    Succeeded,
    #[serde(rename = "E_SYNTAX_ERROR")]
    SyntaxError,
    #[serde(rename = "E_STATEMENT_EMPTY")]
    StatementEmpty,
    #[serde(rename = "E_SEMANTIC_ERROR")]
    SemanticError,
    #[serde(rename = "E_BAD_PERMISSION")]
    BadPermission,
    #[serde(rename = "E_EXECUTION_ERROR")]
    ExecutionError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Succeeded => "SUCCEEDED",
            ErrorCode::SyntaxError => "E_SYNTAX_ERROR",
            ErrorCode::StatementEmpty => "E_STATEMENT_EMPTY",
            ErrorCode::SemanticError => "E_SEMANTIC_ERROR",
            ErrorCode::BadPermission => "E_BAD_PERMISSION",
            ErrorCode::ExecutionError => "E_EXECUTION_ERROR",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Succeeded)
    }
}

impl Default for ErrorCode {
    fn default() -> Self {
        ErrorCode::Succeeded
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
