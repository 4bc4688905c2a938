//! Structured logging for video processing.
//!
//! A [`VideoLogger`] covers one video. Narrowing it with
//! [`VideoLogger::for_category`] gives a logger whose events and span carry
//! the category being produced; its span nests under the video span.

use tracing::{error, info, warn, Span};

/// Logger for one video, optionally narrowed to one output category.
#[derive(Debug, Clone)]
pub struct VideoLogger {
    video: String,
    category: Option<String>,
}

impl VideoLogger {
    pub fn new(video: &str) -> Self {
        Self {
            video: video.to_string(),
            category: None,
        }
    }

    /// The same video, narrowed to one category.
    pub fn for_category(&self, category: &str) -> Self {
        Self {
            video: self.video.clone(),
            category: Some(category.to_string()),
        }
    }

    fn scope(&self) -> &'static str {
        if self.category.is_some() {
            "Category"
        } else {
            "Video"
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            video = %self.video,
            category = self.category.as_deref(),
            "{} started: {}", self.scope(), message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            video = %self.video,
            category = self.category.as_deref(),
            "{} progress: {}", self.scope(), message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            video = %self.video,
            category = self.category.as_deref(),
            "{} warning: {}", self.scope(), message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            video = %self.video,
            category = self.category.as_deref(),
            "{} error: {}", self.scope(), message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            video = %self.video,
            category = self.category.as_deref(),
            "{} completed: {}", self.scope(), message
        );
    }

    /// Span for this logger's scope: `video` for a whole video, `category`
    /// for a narrowed logger (entered inside the video span).
    pub fn create_span(&self) -> Span {
        match &self.category {
            Some(category) => tracing::info_span!("category", category = %category),
            None => tracing::info_span!("video", video = %self.video),
        }
    }
}
