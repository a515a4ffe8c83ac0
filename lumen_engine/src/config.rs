/// Engine configuration and validation-layer debug settings

use std::time::Duration;

/// Number of frame slots cycled by the frame scheduler
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;

/// Which validation messages reach the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugSeverity {
    /// Only errors
    ErrorsOnly,
    /// Errors and warnings
    ErrorsAndWarnings,
    /// Everything, including info and verbose
    All,
}

/// Where validation messages are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugOutput {
    /// Colored output on stderr
    Console,
    /// Plain text appended to a file
    File(String),
    /// Both console and file
    Both(String),
}

/// Message category filter for the validation callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugMessageFilter {
    pub show_general: bool,
    pub show_validation: bool,
    pub show_performance: bool,
}

impl Default for DebugMessageFilter {
    fn default() -> Self {
        Self {
            show_general: true,
            show_validation: true,
            show_performance: true,
        }
    }
}

/// Counters collected by the validation callback
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationStats {
    pub errors: u32,
    pub warnings: u32,
    pub info: u32,
    pub verbose: u32,
}

impl ValidationStats {
    /// Total number of messages of any severity
    pub fn total(&self) -> u32 {
        self.errors + self.warnings + self.info + self.verbose
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Engine configuration
///
/// # Example
///
/// ```
/// use lumen_engine::lumen::Config;
///
/// let config = Config {
///     window_title: "Vase".to_string(),
///     vsync: false,
///     ..Config::default()
/// };
/// assert_eq!(config.window_width, 800);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Application name (passed to the instance)
    pub app_name: String,
    /// Application version (passed to the instance)
    pub app_version: u32,

    /// Initial window title
    pub window_title: String,
    /// Initial window width in pixels
    pub window_width: u32,
    /// Initial window height in pixels
    pub window_height: u32,

    /// Enable the Khronos validation layer (only honored with `vulkan-validation`)
    pub enable_validation: bool,
    /// Validation message severity filter
    pub debug_severity: DebugSeverity,
    /// Validation message destination
    pub debug_output: DebugOutput,
    /// Validation message category filter
    pub debug_message_filter: DebugMessageFilter,
    /// Abort the process on the first validation error
    pub break_on_validation_error: bool,
    /// Panic on the first validation error
    pub panic_on_error: bool,
    /// Count validation messages (see `get_validation_stats`)
    pub enable_validation_stats: bool,

    /// Prefer FIFO presentation (false picks MAILBOX when available)
    pub vsync: bool,
    /// Sleep between drawable-size checks while the window is minimized
    pub resize_poll_interval: Duration,
    /// Color attachment clear value
    pub clear_color: [f32; 4],
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Lumen Application".to_string(),
            app_version: 1,
            window_title: "Lumen".to_string(),
            window_width: 800,
            window_height: 600,
            enable_validation: cfg!(debug_assertions),
            debug_severity: DebugSeverity::ErrorsAndWarnings,
            debug_output: DebugOutput::Console,
            debug_message_filter: DebugMessageFilter::default(),
            break_on_validation_error: false,
            panic_on_error: false,
            enable_validation_stats: false,
            vsync: true,
            resize_poll_interval: Duration::from_millis(100),
            clear_color: [0.01, 0.01, 0.01, 1.0],
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
