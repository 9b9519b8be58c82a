//! Row layout: packing, sequencing and viewport-driven limits.

pub mod packer;
pub mod responsive;
pub mod sequencer;

pub use packer::pack_rows;
pub use responsive::{
    default_breakpoints, Breakpoint, BreakpointTable, ResizeDebouncer, ResizeWatcher,
    ResponsiveController, RowLimits, ViewportClass,
};
pub use sequencer::sequence_rows;
