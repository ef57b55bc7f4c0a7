// Shared processing logic for the CLI and the GUI
pub mod config;
pub mod editor;
pub mod engine;
pub mod error;
pub mod params;
pub mod pipeline;
pub mod source;
pub mod surface;

pub use config::Config;
pub use editor::Editor;
pub use engine::{Engine, EngineHandle, EngineStatus, NativeEngine};
pub use error::{Error, Result};
pub use params::AdjustmentParams;
pub use pipeline::{Outcome, Pipeline, SkipReason};
pub use source::{is_image_file, SourceImage};
pub use surface::Surface;
