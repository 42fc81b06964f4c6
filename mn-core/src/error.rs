//! Error types re-exported from mn-error

pub use mn_error::{MonitorError, Result};
