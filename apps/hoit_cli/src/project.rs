use anyhow::{Context, Result};
use hoit_core::history::EditState;
use hoit_core::types::{SourceSegment, TimeUs};
use hoit_core::{EditorConfig, TimelineEditor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const EXTENSION: &str = "hoit";

/// On-disk project: the transcript plus the edit state layered over it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectFile {
    pub id: Uuid,
    pub name: String,
    pub media_duration: TimeUs,
    #[serde(default)]
    pub config: EditorConfig,
    pub sources: Vec<SourceSegment>,
    pub state: EditState,
}

impl ProjectFile {
    /// Create a project with the initial one-segment-per-source layout.
    /// Without an explicit media duration the last word's end is used.
    pub fn new(
        name: impl Into<String>,
        sources: Vec<SourceSegment>,
        media_duration: Option<TimeUs>,
        config: EditorConfig,
    ) -> Self {
        let media_duration = media_duration.unwrap_or_else(|| {
            sources
                .iter()
                .flat_map(|s| s.words.iter().map(|w| w.end))
                .max()
                .unwrap_or(TimeUs::ZERO)
        });
        let editor = TimelineEditor::new(sources.clone(), media_duration, config.clone());
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            media_duration,
            state: editor.state().clone(),
            config,
            sources,
        }
    }

    pub fn open_editor(&self) -> Result<TimelineEditor> {
        TimelineEditor::from_state(
            self.sources.clone(),
            self.media_duration,
            self.state.clone(),
            self.config.clone(),
        )
        .with_context(|| format!("project '{}' has an invalid edit state", self.name))
    }

    pub fn update_from(&mut self, editor: &TimelineEditor) {
        self.state = editor.state().clone();
    }

    /// Save as pretty-printed JSON, appending `.hoit` if missing. Returns
    /// the path written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = ensure_extension(path.as_ref());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), segments = self.state.segments.len(), "project saved");
        Ok(path)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let project: ProjectFile = serde_json::from_str(&data)
            .with_context(|| format!("{} is not a valid project file", path.display()))?;
        tracing::info!(path = %path.display(), name = %project.name, "project loaded");
        Ok(project)
    }
}

fn ensure_extension(path: &Path) -> PathBuf {
    if path.extension().and_then(|e| e.to_str()) == Some(EXTENSION) {
        path.to_path_buf()
    } else {
        let mut p = path.to_path_buf();
        let mut name = p.file_name().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(EXTENSION);
        p.set_file_name(name);
        p
    }
}
