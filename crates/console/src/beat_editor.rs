//! Beat sequence editor for one project.
//!
//! All edits are local. [`BeatEditor::commit`] is the only operation that
//! writes to the backend: it captures the sequence at call time and
//! returns a detached future, so edits may continue while the write is in
//! flight and the last commit wins.

use std::future::Future;
use std::sync::Arc;

use studio_client::ArtifactBackend;
use studio_core::beats::{Beat, BeatSequence};
use studio_core::types::OperationId;

use crate::error::ConsoleError;

pub struct BeatEditor {
    backend: Arc<dyn ArtifactBackend>,
    project_id: Option<OperationId>,
    sequence: BeatSequence,
    gap_secs: f64,
}

impl BeatEditor {
    /// An editor with no project open. `gap_secs` spaces appended beats.
    pub fn new(backend: Arc<dyn ArtifactBackend>, gap_secs: f64) -> Self {
        Self {
            backend,
            project_id: None,
            sequence: BeatSequence::default(),
            gap_secs,
        }
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn sequence(&self) -> &BeatSequence {
        &self.sequence
    }

    /// Replace everything with `sequence`, discarding unsaved edits.
    pub fn load(&mut self, project_id: impl Into<OperationId>, sequence: BeatSequence) {
        self.project_id = Some(project_id.into());
        self.sequence = sequence;
    }

    /// Fetch and load a project's beats.
    ///
    /// On failure the project is still opened with an empty sequence and
    /// the error is returned.
    pub async fn open(&mut self, project_id: &str) -> Result<(), ConsoleError> {
        match self.backend.get_beats(project_id).await {
            Ok(response) => {
                tracing::debug!(project_id, beats = response.beats.len(), "Beats loaded");
                self.load(project_id, response.into());
                Ok(())
            }
            Err(e) => {
                tracing::warn!(project_id, error = %e, "Failed to load beats");
                self.load(project_id, BeatSequence::default());
                Err(e.into())
            }
        }
    }

    pub fn set_beat_time(&mut self, index: usize, t: f64) -> Result<(), ConsoleError> {
        Ok(self.sequence.set_time(index, t)?)
    }

    /// Set a beat's narration text and caption. Index 0 also updates the hook.
    pub fn set_beat_text(&mut self, index: usize, text: &str) -> Result<(), ConsoleError> {
        Ok(self.sequence.set_text(index, text)?)
    }

    pub fn move_up(&mut self, index: usize) -> Result<(), ConsoleError> {
        Ok(self.sequence.move_up(index)?)
    }

    pub fn move_down(&mut self, index: usize) -> Result<(), ConsoleError> {
        Ok(self.sequence.move_down(index)?)
    }

    pub fn remove(&mut self, index: usize) -> Result<Beat, ConsoleError> {
        Ok(self.sequence.remove(index)?)
    }

    /// Append a placeholder beat. Returns its index.
    pub fn append(&mut self) -> Result<usize, ConsoleError> {
        Ok(self.sequence.append(self.gap_secs)?)
    }

    /// Write `{beats, hook, title}` as it stands now.
    pub fn commit(&self) -> impl Future<Output = Result<(), ConsoleError>> + Send + 'static {
        let backend = Arc::clone(&self.backend);
        let project_id = self.project_id.clone();
        let sequence = self.sequence.clone();

        async move {
            let project_id = project_id.ok_or(ConsoleError::NoProjectOpen)?;
            backend.put_beats(&project_id, &sequence).await?;
            tracing::info!(project_id = %project_id, beats = sequence.len(), "Beats saved");
            Ok(())
        }
    }
}
