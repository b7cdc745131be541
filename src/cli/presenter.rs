use crate::common::config::DisplayConfig;
use crate::core::{DisplayImage, UiState};
use crossterm::style::Stylize;
use std::path::PathBuf;

/// Terminal rendering of [`UiState`]: status line colored by the
/// authenticated flag, then the visitor image reference.
pub struct Presenter {
    placeholder: PathBuf,
}

impl Presenter {
    pub fn new(config: &DisplayConfig) -> Self {
        Self { placeholder: config.placeholder.clone() }
    }

    pub fn image_ref(&self, state: &UiState) -> String {
        match &state.display {
            DisplayImage::Remote(url) => url.clone(),
            DisplayImage::Placeholder => self.placeholder.display().to_string(),
        }
    }

    pub fn detail_lines(&self, state: &UiState) -> Vec<String> {
        let mut lines = vec![format!("Visitor image: {}", self.image_ref(state))];

        match &state.pending {
            Some(image) => lines.push(format!(
                "Pending image: {} ({}, {} bytes)", image.file_name(), image.content_type(), image.len()
            )),
            None => lines.push("Pending image: none".to_string()),
        }

        if let Some(id) = state.in_flight {
            lines.push(format!("Submission #{} in progress", id));
        }
        lines
    }

    pub fn status_line(&self, state: &UiState) -> String {
        format!("[{}] {}", state.updated_at.format("%H:%M:%S"), state.message)
    }

    pub fn print(&self, state: &UiState) {
        let status = self.status_line(state);
        if state.authenticated {
            println!("{}", status.green().bold());
        } else {
            println!("{}", status.red().bold());
        }

        for line in self.detail_lines(state) {
            println!("  {}", line);
        }
    }
}
