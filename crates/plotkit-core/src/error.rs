//! Error types shared across plotkit crates.
//!
//! `DeviceError` covers everything that can go wrong while declaring,
//! registering and instantiating device extensions. The configuration
//! accessors on declarations never fail and therefore never produce one.
//!
//! ## Error Categories
//!
//! 1. **Declaration errors** - `MissingId`, `InvalidDeclaration`, `DuplicateId`
//!    - Raised when a declaration is registered
//!    - Recovery: fix the declaration or manifest and register again
//!
//! 2. **Resolution errors** - `NotFound`, `Unsupported`, `MissingFactory`
//!    - Raised when the host wires a driver to a protocol or transport
//!
//! 3. **Loading errors** - `Manifest`, `Config`, `Io`
//!    - Raised while reading manifests or the application config

use std::fmt;
use thiserror::Error;

/// Convenience alias for results using [`DeviceError`].
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

/// A single field-level problem found while validating a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationError {
    /// Dotted path to the offending field (e.g. `protocols[1]`)
    pub path: String,
    /// Human-readable message
    pub message: String,
}

impl DeclarationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for DeclarationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

fn join_errors(errors: &[DeclarationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Primary error type for device extension handling.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Declaration has no ID and none could be derived from manufacturer/model.
    #[error("Declaration for '{point}' has no id and none can be derived")]
    MissingId { point: &'static str },

    /// Declaration failed field validation.
    #[error("Invalid declaration '{id}' for '{point}': {}", join_errors(.errors))]
    InvalidDeclaration {
        point: &'static str,
        id: String,
        errors: Vec<DeclarationError>,
    },

    /// A declaration with the same ID is already registered.
    #[error("Duplicate id '{id}' on extension point '{point}'")]
    DuplicateId { point: &'static str, id: String },

    /// No declaration with this ID is registered.
    #[error("No declaration '{id}' registered on '{point}'")]
    NotFound { point: &'static str, id: String },

    /// The driver does not list the requested protocol/transport.
    #[error("Driver '{driver}' does not support '{id}' on '{point}'")]
    Unsupported {
        driver: String,
        point: &'static str,
        id: String,
    },

    /// The declaration has no factory to build a runtime object.
    #[error("Declaration '{id}' on '{point}' has no factory")]
    MissingFactory { point: &'static str, id: String },

    /// A factory returned an error while building a runtime object.
    #[error("Factory for '{id}' failed: {message}")]
    Factory { id: String, message: String },

    /// A manifest file could not be read, parsed or validated.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// Application configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeviceError {
    /// Wrap a factory failure for the declaration `id`.
    pub fn factory(id: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Factory {
            id: id.into(),
            message: message.to_string(),
        }
    }

    /// Returns true for errors caused by the declaration itself rather than
    /// by the host wiring or the filesystem.
    pub fn is_declaration_error(&self) -> bool {
        matches!(
            self,
            Self::MissingId { .. } | Self::InvalidDeclaration { .. } | Self::DuplicateId { .. }
        )
    }
}
