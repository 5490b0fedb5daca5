//! Titles shown in the middle of the screen.

use std::time::Duration;

use super::component::Component;

/// Fade-in, stay and fade-out durations of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TitleTimes {
    pub fade_in: Duration,
    pub stay: Duration,
    pub fade_out: Duration,
}

impl TitleTimes {
    /// Creates title times.
    pub fn new(fade_in: Duration, stay: Duration, fade_out: Duration) -> Self {
        Self {
            fade_in,
            stay,
            fade_out,
        }
    }
}

impl Default for TitleTimes {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(500),
            Duration::from_millis(3500),
            Duration::from_millis(1000),
        )
    }
}

crate::canonical_object!(TitleTimes, "mimic.TitleTimes");
crate::from_object_value!(TitleTimes, "title times");

named_enum! {
    /// A part of a title that can be sent on its own.
    pub enum TitlePart {
        Title => "TITLE",
        Subtitle => "SUBTITLE",
        Times => "TIMES",
    }
}

/// A complete title.
#[derive(Debug, Clone, PartialEq)]
pub struct Title {
    pub title: Component,
    pub subtitle: Component,
    pub times: Option<TitleTimes>,
}

impl Title {
    /// Creates a title with default times.
    pub fn new(title: impl Into<Component>, subtitle: impl Into<Component>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            times: None,
        }
    }

    /// Sets explicit times.
    pub fn with_times(mut self, times: TitleTimes) -> Self {
        self.times = Some(times);
        self
    }

    /// Returns the effective times.
    pub fn effective_times(&self) -> TitleTimes {
        self.times.unwrap_or_default()
    }
}

crate::canonical_object!(Title, "mimic.Title");
crate::from_object_value!(Title, "title");
