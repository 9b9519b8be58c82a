//! The display side of the renderer.
//!
//! A [`RowSurface`] materializes display rows (a DOM container, a terminal,
//! a test recorder). The renderer only talks to it through this trait.

use std::fmt::Write as _;
use std::time::Duration;

use tokio::sync::oneshot;

use crate::models::{DisplayRow, MediaItem};
use crate::ui::transition::CompletionSignal;

pub trait RowSurface {
    /// Whether the surface has a container to render into.
    fn is_mounted(&self) -> bool {
        true
    }

    /// Swaps all rows at once, without animation.
    fn replace_rows(&mut self, rows: &[DisplayRow]);

    /// Starts fading out the current rows.
    fn fade_out_rows(&mut self, duration: Duration) -> CompletionSignal;

    fn remove_rows(&mut self);

    /// Inserts rows with opacity 0, ready to be faded in.
    fn insert_hidden_rows(&mut self, rows: &[DisplayRow]);

    fn fade_in_row(&mut self, row_index: usize, delay: Duration, duration: Duration);

    /// Inline error shown in place of the gallery.
    fn show_error(&mut self, message: &str);

    /// Items already present on the page before any document loaded.
    fn existing_items(&self) -> Vec<MediaItem> {
        Vec::new()
    }
}

/// How a [`TextSurface`] answers fade-out requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FadeSignal {
    /// Completion fires right away.
    #[default]
    Immediate,
    /// Completion never fires; the renderer must rely on its timer.
    Never,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Replaced(usize),
    FadeOut,
    Removed,
    InsertedHidden(usize),
    FadeIn { row: usize, delay: Duration },
    Error(String),
}

/// In-memory surface that records what it was asked to do and can print
/// the current rows as text.
#[derive(Debug, Default)]
pub struct TextSurface {
    rows: Vec<DisplayRow>,
    visible: Vec<bool>,
    events: Vec<SurfaceEvent>,
    error: Option<String>,
    preloaded: Vec<MediaItem>,
    fade_signal: FadeSignal,
    unmounted: bool,
    // Keeps `Never` signals pending instead of dropped.
    held_senders: Vec<oneshot::Sender<()>>,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fade_signal(mut self, fade_signal: FadeSignal) -> Self {
        self.fade_signal = fade_signal;
        self
    }

    /// Items the page already shows, used when documents fail to load.
    pub fn with_existing_items(mut self, items: Vec<MediaItem>) -> Self {
        self.preloaded = items;
        self
    }

    pub fn unmounted() -> Self {
        Self {
            unmounted: true,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn events(&self) -> &[SurfaceEvent] {
        &self.events
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn all_visible(&self) -> bool {
        self.visible.iter().all(|v| *v)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if let Some(error) = &self.error {
            let _ = writeln!(out, "error: {error}");
        }
        for row in &self.rows {
            let ids: Vec<&str> = row.items.iter().map(|i| i.id.as_str()).collect();
            let _ = writeln!(
                out,
                "{:>3}  {:<9}  [{}]",
                row.row_index,
                row.row_class.as_str(),
                ids.join(", ")
            );
        }
        out
    }
}

impl RowSurface for TextSurface {
    fn is_mounted(&self) -> bool {
        !self.unmounted
    }

    fn replace_rows(&mut self, rows: &[DisplayRow]) {
        self.rows = rows.to_vec();
        self.visible = vec![true; rows.len()];
        self.error = None;
        self.events.push(SurfaceEvent::Replaced(rows.len()));
    }

    fn fade_out_rows(&mut self, _duration: Duration) -> CompletionSignal {
        self.events.push(SurfaceEvent::FadeOut);
        let (tx, rx) = oneshot::channel();
        match self.fade_signal {
            FadeSignal::Immediate => {
                let _ = tx.send(());
            }
            FadeSignal::Never => self.held_senders.push(tx),
        }
        rx
    }

    fn remove_rows(&mut self) {
        self.rows.clear();
        self.visible.clear();
        self.held_senders.clear();
        self.events.push(SurfaceEvent::Removed);
    }

    fn insert_hidden_rows(&mut self, rows: &[DisplayRow]) {
        self.rows = rows.to_vec();
        self.visible = vec![false; rows.len()];
        self.error = None;
        self.events.push(SurfaceEvent::InsertedHidden(rows.len()));
    }

    fn fade_in_row(&mut self, row_index: usize, delay: Duration, _duration: Duration) {
        if let Some(visible) = self.visible.get_mut(row_index) {
            *visible = true;
        }
        self.events.push(SurfaceEvent::FadeIn {
            row: row_index,
            delay,
        });
    }

    fn show_error(&mut self, message: &str) {
        self.error = Some(message.to_string());
        self.events.push(SurfaceEvent::Error(message.to_string()));
    }

    fn existing_items(&self) -> Vec<MediaItem> {
        self.preloaded.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_signal_is_released_on_remove() {
        let mut surface = TextSurface::new().with_fade_signal(FadeSignal::Never);
        for _ in 0..3 {
            let mut signal = surface.fade_out_rows(Duration::from_millis(100));
            assert!(signal.try_recv().is_err());
            assert_eq!(surface.held_senders.len(), 1);

            surface.remove_rows();
            assert!(surface.held_senders.is_empty());
            assert_eq!(
                signal.try_recv(),
                Err(oneshot::error::TryRecvError::Closed)
            );
        }
    }

    #[test]
    fn test_immediate_signal_fires() {
        let mut surface = TextSurface::new();
        let mut signal = surface.fade_out_rows(Duration::from_millis(100));
        assert_eq!(signal.try_recv(), Ok(()));
        assert!(surface.held_senders.is_empty());
    }
}
