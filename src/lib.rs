//! Clipdeck clip assembly library
//!
//! A non-linear editing engine for multi-track clip assemblies with bounded
//! undo/redo history, pointer gesture and zoom controllers, lenient session
//! hydration, and transcript to subtitle cue segmentation.

pub mod adapters;
pub mod app;
pub mod assembly;
pub mod cli;
pub mod clips;
pub mod config_initialization;
pub mod domain;
pub mod edit;
pub mod error;
pub mod history;
pub mod ports;
pub mod resolver;
pub mod session;
pub mod subtitles;

// Re-export commonly used types
pub use app::{EditorSession, PlaybackTarget};
pub use domain::config::EngineConfig;
pub use domain::errors::DomainError;
pub use domain::model::{
    AssemblyItem, AssemblyTrack, ClipAssemblyState, ClipSegment, Edge, ItemSource, TimeSpec, TimelineSnapshot,
    TrackKind,
};
pub use error::{ClipdeckError, ClipdeckResult};
pub use history::TimelineHistory;
pub use session::SessionState;
