//! Result type alias shared across the workspace.
//!
//! This module defines a convenient alias that defaults the error type to the
//! common `ExchangeError`, so functions can simply return `Result<T>`.
use crate::error::ExchangeError;

/// Workspace-wide `Result` alias with `ExchangeError` as the default error.
pub type Result<T, E = ExchangeError> = std::result::Result<T, E>;
