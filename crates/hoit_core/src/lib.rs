pub mod config;
pub mod editing;
pub mod editor;
pub mod error;
pub mod history;
pub mod ranges;
pub mod types;
pub mod words;

pub use config::EditorConfig;
pub use editor::TimelineEditor;
pub use error::{CoreError, Result};
