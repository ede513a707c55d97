//! Error types for stage loading and lifecycle.

use thiserror::Error;

use super::stage::StageState;
use crate::camera::CameraError;

/// Errors that can occur when loading stage definitions.
#[derive(Debug, Error)]
pub enum StageLoadError {
    /// File could not be found.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// File could not be read.
    #[error("Failed to read file '{path}': {details}")]
    ReadError { path: String, details: String },

    /// RON parsing failed.
    #[error("Parse error in '{path}': {details}")]
    ParseError { path: String, details: String },

    /// The definition parsed but describes an impossible stage.
    #[error("Invalid stage '{stage}': {details}")]
    InvalidDefinition { stage: String, details: String },
}

/// Errors raised while driving a stage.
#[derive(Debug, Error)]
pub enum StageError {
    /// Lifecycle operation called in the wrong state.
    #[error("Cannot {operation} a stage that is {state:?}")]
    InvalidTransition {
        operation: &'static str,
        state: StageState,
    },

    /// Camera activation failed.
    #[error(transparent)]
    Camera(#[from] CameraError),
}
