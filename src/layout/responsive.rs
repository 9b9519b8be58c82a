//! Viewport classification and debounced resize handling.
//!
//! Container widths map to a [`ViewportClass`] through an ordered breakpoint
//! table. The controller only reports new [`RowLimits`] when they differ from
//! the limits currently applied, so resizes within one class never trigger a
//! re-layout.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewportClass {
    Mobile,
    Tablet,
    Desktop,
    Widescreen,
}

/// Row-size constraints for one viewport class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowLimits {
    pub landscape_max: usize,
    pub portrait_max: usize,
    pub min_images: usize,
}

impl RowLimits {
    pub const fn new(landscape_max: usize, portrait_max: usize, min_images: usize) -> Self {
        Self {
            landscape_max,
            portrait_max,
            min_images,
        }
    }
}

impl Default for RowLimits {
    fn default() -> Self {
        Self::new(3, 4, 2)
    }
}

/// Widths at or above `min_width` (and below the next entry) use `limits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Breakpoint {
    pub min_width: u32,
    pub class: ViewportClass,
    pub limits: RowLimits,
}

pub fn default_breakpoints() -> Vec<Breakpoint> {
    vec![
        Breakpoint {
            min_width: 0,
            class: ViewportClass::Mobile,
            limits: RowLimits::new(1, 2, 1),
        },
        Breakpoint {
            min_width: 600,
            class: ViewportClass::Tablet,
            limits: RowLimits::new(2, 3, 2),
        },
        Breakpoint {
            min_width: 1024,
            class: ViewportClass::Desktop,
            limits: RowLimits::new(3, 4, 2),
        },
        Breakpoint {
            min_width: 1600,
            class: ViewportClass::Widescreen,
            limits: RowLimits::new(4, 5, 2),
        },
    ]
}

/// Validated, ascending breakpoint table whose first entry starts at 0.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakpointTable {
    entries: Vec<Breakpoint>,
}

impl BreakpointTable {
    pub fn new(entries: Vec<Breakpoint>) -> Result<Self, ConfigError> {
        match entries.first() {
            None => {
                return Err(ConfigError::Validation(
                    "breakpoints must not be empty".into(),
                ))
            }
            Some(first) if first.min_width != 0 => {
                return Err(ConfigError::Validation(
                    "the first breakpoint must start at min_width = 0".into(),
                ))
            }
            Some(_) => {}
        }
        if entries.windows(2).any(|w| w[0].min_width >= w[1].min_width) {
            return Err(ConfigError::Validation(
                "breakpoints must be sorted by strictly increasing min_width".into(),
            ));
        }
        if let Some(bad) = entries
            .iter()
            .find(|b| b.limits.landscape_max == 0 || b.limits.portrait_max == 0)
        {
            return Err(ConfigError::Validation(format!(
                "{:?} limits must allow at least one item per row",
                bad.class
            )));
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[Breakpoint] {
        &self.entries
    }

    pub fn classify(&self, width: f32) -> &Breakpoint {
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        self.entries
            .iter()
            .rev()
            .find(|b| width >= b.min_width as f32)
            .unwrap_or(&self.entries[0])
    }
}

impl Default for BreakpointTable {
    fn default() -> Self {
        Self {
            entries: default_breakpoints(),
        }
    }
}

/// Tracks the limits currently applied to the rendered layout.
#[derive(Debug, Clone)]
pub struct ResponsiveController {
    table: BreakpointTable,
    applied: Option<RowLimits>,
    applied_class: Option<ViewportClass>,
}

impl ResponsiveController {
    pub fn new(table: BreakpointTable) -> Self {
        Self {
            table,
            applied: None,
            applied_class: None,
        }
    }

    pub fn limits_for(&self, width: f32) -> (ViewportClass, RowLimits) {
        let bp = self.table.classify(width);
        (bp.class, bp.limits)
    }

    /// Returns new limits when `width` maps to limits different from the
    /// applied ones, and records them as applied.
    pub fn evaluate(&mut self, width: f32) -> Option<RowLimits> {
        let (class, limits) = self.limits_for(width);
        if self.applied == Some(limits) {
            trace!(width, ?class, "Viewport class unchanged");
            return None;
        }
        debug!(width, ?class, ?limits, "Row limits changed");
        self.applied = Some(limits);
        self.applied_class = Some(class);
        Some(limits)
    }

    pub fn applied(&self) -> Option<RowLimits> {
        self.applied
    }

    pub fn applied_class(&self) -> Option<ViewportClass> {
        self.applied_class
    }
}

/// Collapses bursts of width observations into one settled width.
pub struct ResizeDebouncer {
    rx: flume::Receiver<f32>,
    quiet: Duration,
}

impl ResizeDebouncer {
    pub fn new(rx: flume::Receiver<f32>, quiet: Duration) -> Self {
        Self { rx, quiet }
    }

    /// Creates a debouncer together with the sender resize events go into.
    pub fn channel(quiet: Duration) -> (flume::Sender<f32>, Self) {
        let (tx, rx) = flume::unbounded();
        (tx, Self::new(rx, quiet))
    }

    /// Waits for the next width that stays unchanged for the quiet period.
    ///
    /// Returns `None` once every sender is gone and nothing is pending.
    pub async fn next_settled(&mut self) -> Option<f32> {
        let mut latest = self.rx.recv_async().await.ok()?;
        loop {
            match tokio::time::timeout(self.quiet, self.rx.recv_async()).await {
                Ok(Ok(width)) => latest = width,
                Ok(Err(_)) | Err(_) => return Some(latest),
            }
        }
    }
}

/// Debounced resize stream feeding a [`ResponsiveController`].
pub struct ResizeWatcher {
    debouncer: ResizeDebouncer,
    controller: ResponsiveController,
}

impl ResizeWatcher {
    pub fn new(debouncer: ResizeDebouncer, controller: ResponsiveController) -> Self {
        Self {
            debouncer,
            controller,
        }
    }

    pub fn controller(&self) -> &ResponsiveController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ResponsiveController {
        &mut self.controller
    }

    /// Waits until a settled width changes the applied limits.
    pub async fn next_change(&mut self) -> Option<RowLimits> {
        loop {
            let width = self.debouncer.next_settled().await?;
            if let Some(limits) = self.controller.evaluate(width) {
                return Some(limits);
            }
        }
    }
}
