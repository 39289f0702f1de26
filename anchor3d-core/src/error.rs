/// Errors raised while setting up labels
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LabelError {
    /// The scene had no active camera when the label was created
    #[error("no active camera in scene")]
    NoActiveCamera,

    /// The overlay backend could not create or attach an element
    #[error("overlay error: {0}")]
    Overlay(String),
}
