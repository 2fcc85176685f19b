// Application layer - Use case interactors

pub mod container;
pub mod editor_interactor;
pub mod session_interactor;

// Re-export interactors
pub use editor_interactor::{EditorSession, PlaybackTarget};
pub use session_interactor::SessionInteractor;
