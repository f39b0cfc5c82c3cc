//! Core document model, step-reveal annotation, and project configuration
//! for rendered slide decks.

pub mod annotate;
pub mod config;
pub mod dom;
pub mod error;

pub use annotate::{AnnotationReport, StepRevealAnnotator, INNER_STEP_CLASS, STRICT_SELECTOR};
pub use config::{AssetKind, AssetLayout, ProjectConfig, CONFIG_FILE_NAME};
pub use dom::{Document, Element, NodeData, NodeId};
pub use error::{Error, Result};
