/// Validation layer messenger with colored console output, file logging,
/// message statistics and break-on-error
///
/// Only compiled with the `vulkan-validation` feature.

use ash::vk;
use colored::*;
use rustc_hash::FxHashMap;
use std::ffi::CStr;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use lumen_engine::config::{Config, DebugMessageFilter, DebugOutput, DebugSeverity, ValidationStats};
use lumen_engine::lumen::{Error, Result};
use lumen_engine::engine_error;

use crate::vulkan_context::DebugMessenger;

static DEBUG_CONFIG: Mutex<Option<DebugConfig>> = Mutex::new(None);

static VALIDATION_STATS: StatsCounters = StatsCounters::new();

/// Occurrences of each message text since the messenger was created
static MESSAGE_COUNTS: Mutex<Option<FxHashMap<String, u32>>> = Mutex::new(None);

/// Subset of `Config` read by the callback
#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub severity: DebugSeverity,
    pub output: DebugOutput,
    pub message_filter: DebugMessageFilter,
    pub break_on_error: bool,
    pub panic_on_error: bool,
    pub enable_stats: bool,
}

impl DebugConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            severity: config.debug_severity,
            output: config.debug_output.clone(),
            message_filter: config.debug_message_filter,
            break_on_error: config.break_on_validation_error,
            panic_on_error: config.panic_on_error,
            enable_stats: config.enable_validation_stats,
        }
    }
}

struct StatsCounters {
    errors: AtomicU32,
    warnings: AtomicU32,
    info: AtomicU32,
    verbose: AtomicU32,
}

impl StatsCounters {
    const fn new() -> Self {
        Self {
            errors: AtomicU32::new(0),
            warnings: AtomicU32::new(0),
            info: AtomicU32::new(0),
            verbose: AtomicU32::new(0),
        }
    }

    fn record(&self, severity: vk::DebugUtilsMessageSeverityFlagsEXT) {
        let counter = if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
            &self.errors
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
            &self.warnings
        } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
            &self.info
        } else {
            &self.verbose
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ValidationStats {
        ValidationStats {
            errors: self.errors.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
            info: self.info.load(Ordering::Relaxed),
            verbose: self.verbose.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.errors.store(0, Ordering::Relaxed);
        self.warnings.store(0, Ordering::Relaxed);
        self.info.store(0, Ordering::Relaxed);
        self.verbose.store(0, Ordering::Relaxed);
    }
}

/// Install the callback configuration and reset statistics
pub fn init_debug_config(config: DebugConfig) {
    VALIDATION_STATS.reset();
    if let Ok(mut counts) = MESSAGE_COUNTS.lock() {
        *counts = Some(FxHashMap::default());
    }
    if let Ok(mut slot) = DEBUG_CONFIG.lock() {
        *slot = Some(config);
    }
}

/// Remove the callback configuration; later messages are ignored
pub fn cleanup_debug_config() {
    if let Ok(mut slot) = DEBUG_CONFIG.lock() {
        *slot = None;
    }
}

/// Message counters collected since the device was created
pub fn get_validation_stats() -> ValidationStats {
    VALIDATION_STATS.snapshot()
}

/// Print the counters (and repeated message count) to stdout
pub fn print_validation_stats_report() {
    let stats = get_validation_stats();

    if stats.total() == 0 {
        println!("\n{}", "No validation messages".green().bold());
        return;
    }

    println!("\n{}", "=== Validation Statistics ===".bright_blue().bold());
    if stats.errors > 0 {
        println!("  {} {}", "Errors:".red().bold(), stats.errors);
    }
    if stats.warnings > 0 {
        println!("  {} {}", "Warnings:".yellow().bold(), stats.warnings);
    }
    if stats.info > 0 {
        println!("  {} {}", "Info:".cyan(), stats.info);
    }
    if stats.verbose > 0 {
        println!("  {} {}", "Verbose:".bright_black(), stats.verbose);
    }
    println!("  {} {}", "Total:".white().bold(), stats.total());

    if let Ok(counts) = MESSAGE_COUNTS.lock() {
        let repeated = counts
            .as_ref()
            .map(|counts| counts.values().filter(|&&count| count > 1).count())
            .unwrap_or(0);
        if repeated > 0 {
            println!("  {} message(s) repeated", repeated);
        }
    }
    println!("{}\n", "=============================".bright_blue().bold());
}

/// Severity bits requested from the messenger
pub(crate) fn severity_flags(severity: DebugSeverity) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    match severity {
        DebugSeverity::ErrorsOnly => vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        DebugSeverity::ErrorsAndWarnings => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
        }
        DebugSeverity::All => {
            vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
        }
    }
}

fn category_shown(filter: &DebugMessageFilter, message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> bool {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        filter.show_validation
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        filter.show_performance
    } else {
        filter.show_general
    }
}

fn type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "Validation"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "Performance"
    } else {
        "General"
    }
}

/// Create the messenger and install the callback configuration
pub(crate) fn create_debug_messenger(
    entry: &ash::Entry,
    instance: &ash::Instance,
    config: &Config,
) -> Result<DebugMessenger> {
    init_debug_config(DebugConfig::from_config(config));

    let loader = ash::ext::debug_utils::Instance::new(entry, instance);
    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(severity_flags(config.debug_severity))
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(vulkan_debug_callback));

    let messenger = unsafe { loader.create_debug_utils_messenger(&create_info, None) }
        .map_err(|e| {
            engine_error!("lumen::vulkan", "Failed to create debug messenger: {:?}", e);
            Error::InitializationFailed(format!("Failed to create debug messenger: {:?}", e))
        })?;

    Ok(DebugMessenger { loader, messenger })
}

unsafe fn c_str_or<'a>(ptr: *const std::os::raw::c_char, fallback: &'a str) -> &'a str {
    if ptr.is_null() {
        fallback
    } else {
        CStr::from_ptr(ptr).to_str().unwrap_or("<invalid utf-8>")
    }
}

/// Messenger callback: filter, count, print, then optionally panic or abort
pub unsafe extern "system" fn vulkan_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::os::raw::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }
    let callback_data = *p_callback_data;
    let message_id = c_str_or(callback_data.p_message_id_name, "Unknown");
    let message = c_str_or(callback_data.p_message, "No message");

    let config = match DEBUG_CONFIG.lock() {
        Ok(guard) => match guard.as_ref() {
            Some(config) => config.clone(),
            None => return vk::FALSE,
        },
        Err(_) => return vk::FALSE,
    };

    if !severity_flags(config.severity).intersects(message_severity)
        || !category_shown(&config.message_filter, message_type)
    {
        return vk::FALSE;
    }

    let is_error = message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR);
    let (severity_plain, severity_colored) = if is_error {
        ("ERROR", "ERROR".red().bold())
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        ("WARNING", "WARNING".yellow().bold())
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        ("INFO", "INFO".cyan())
    } else {
        ("VERBOSE", "VERBOSE".bright_black())
    };
    let kind = type_name(message_type);

    let occurrences = if config.enable_stats {
        VALIDATION_STATS.record(message_severity);
        match MESSAGE_COUNTS.lock() {
            Ok(mut counts) => {
                let count = counts
                    .get_or_insert_with(FxHashMap::default)
                    .entry(message.to_string())
                    .or_insert(0);
                *count += 1;
                *count
            }
            Err(_) => 1,
        }
    } else {
        1
    };
    let repeat = if occurrences > 1 { format!(" [x{}]", occurrences) } else { String::new() };

    let console_line = format!(
        "{} {} [{}]{}\n  ├─ {}: {}\n  └─ {}\n",
        "[VULKAN".bright_blue().bold(),
        format!("{}]", severity_colored).bright_blue().bold(),
        kind.bright_black(),
        repeat.yellow(),
        "Message ID".bright_black(),
        message_id.white(),
        message.white()
    );
    let file_line = format!(
        "[VULKAN {}] [{}]{}\n  ├─ Message ID: {}\n  └─ {}\n",
        severity_plain, kind, repeat, message_id, message
    );

    match &config.output {
        DebugOutput::Console => eprint!("{}", console_line),
        DebugOutput::File(path) => append_to_file(path, &file_line),
        DebugOutput::Both(path) => {
            eprint!("{}", console_line);
            append_to_file(path, &file_line);
        }
    }

    if is_error && config.panic_on_error {
        panic!("Validation error (panic_on_error)\nMessage ID: {}\nType: {}\nMessage: {}",
            message_id, kind, message);
    }

    if is_error && config.break_on_error {
        eprintln!("\n{}\n  Context: {} [{}]\n  Message: {}\n",
            "BREAK ON VALIDATION ERROR - aborting".red().bold(),
            message_id.yellow(), kind.cyan(), message.white());
        std::process::abort();
    }

    vk::FALSE
}

fn append_to_file(path: &str, line: &str) {
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path) {
        let _ = writeln!(file, "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_flags_widen_with_level() {
        let errors = severity_flags(DebugSeverity::ErrorsOnly);
        let warnings = severity_flags(DebugSeverity::ErrorsAndWarnings);
        let all = severity_flags(DebugSeverity::All);

        assert_eq!(errors, vk::DebugUtilsMessageSeverityFlagsEXT::ERROR);
        assert!(warnings.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING));
        assert!(!warnings.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO));
        assert!(all.contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE));
    }

    #[test]
    fn test_category_filter() {
        let filter = DebugMessageFilter {
            show_general: false,
            show_validation: true,
            show_performance: false,
        };
        assert!(category_shown(&filter, vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION));
        assert!(!category_shown(&filter, vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE));
        assert!(!category_shown(&filter, vk::DebugUtilsMessageTypeFlagsEXT::GENERAL));
    }

    #[test]
    fn test_debug_config_from_config() {
        let config = Config {
            debug_severity: DebugSeverity::All,
            debug_output: DebugOutput::File("validation.log".to_string()),
            panic_on_error: true,
            ..Config::default()
        };
        let debug = DebugConfig::from_config(&config);
        assert_eq!(debug.severity, DebugSeverity::All);
        assert_eq!(debug.output, DebugOutput::File("validation.log".to_string()));
        assert!(debug.panic_on_error);
        assert!(!debug.break_on_error);
    }

    #[test]
    fn test_counters_sort_by_severity() {
        let counters = StatsCounters::new();
        counters.record(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR);
        counters.record(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING);
        counters.record(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING);
        counters.record(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE);

        let stats = counters.snapshot();
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.warnings, 2);
        assert_eq!(stats.verbose, 1);
        assert_eq!(stats.total(), 4);

        counters.reset();
        assert_eq!(counters.snapshot().total(), 0);
    }
}
