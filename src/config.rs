//! Runtime configuration loading from environment variables.
//!
//! All values are loaded from `FORKLINK_*` environment variables with safe
//! defaults. Invalid values fall back to defaults without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `FORKLINK_USE_FILE` | true | Write reports to files |
//! | `FORKLINK_PRINT_SUMMARY` | true | Print the run summary |
//! | `FORKLINK_REPORT_FORMAT` | brief | Report format name |
//! | `FORKLINK_REDIRECT_OUTPUT` | false | Redirect test output to file |
//! | `FORKLINK_DISABLE_XML_REPORT` | false | Skip structured report output |
//! | `FORKLINK_REPORTS_DIR` | reports | Reports directory |
//! | `FORKLINK_TRIM_STACKTRACE` | true | Trim stack traces in reports |
//! | `FORKLINK_REPORT_NAME_SUFFIX` | (empty) | Suffix appended to report names |
//! | `FORKLINK_STATISTICS_FILE` | reports/statistics.txt | Run statistics file |
//! | `FORKLINK_RUN_HISTORY` | false | Keep per-run history |
//! | `FORKLINK_RERUN_COUNT` | 0 | Reruns for failing tests (floor 0) |
//! | `FORKLINK_XSD_SCHEMA` | (empty) | Schema location stamped in reports |
//! | `FORKLINK_ENCODING` | UTF-8 | Report encoding name |
//! | `FORKLINK_LOG_LEVEL` | info | Log level filter |
//! | `FORKLINK_LOG_FORMAT` | json | Log format (json, pretty) |

use std::path::PathBuf;

use serde::Serialize;

use crate::bridge::ReportSettings;
use crate::logging::LogFormat;

/// All runtime configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub report: ReportSettings,
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Effective configuration summary (serializable).
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub use_file: bool,
    pub print_summary: bool,
    pub report_format: String,
    pub redirect_output_to_file: bool,
    pub disable_xml_report: bool,
    pub reports_directory: PathBuf,
    pub trim_stack_trace: bool,
    pub report_name_suffix: String,
    pub statistics_file: PathBuf,
    pub requires_run_history: bool,
    pub rerun_failing_tests_count: i32,
    pub xsd_schema_location: String,
    pub encoding_name: String,
    pub log_level: String,
    pub log_format: String,
}

/// Parse a boolean env var, returning `default` on missing or invalid.
fn parse_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => match val.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => true,
            "false" | "0" | "no" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

/// Parse an `i32` env var, returning `default` on missing or invalid.
fn parse_i32(key: &str, default: i32) -> i32 {
    match std::env::var(key) {
        Ok(val) => val.parse::<i32>().unwrap_or(default),
        Err(_) => default,
    }
}

fn parse_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_path(key: &str, default: &str) -> PathBuf {
    std::env::var(key).map(PathBuf::from).unwrap_or_else(|_| PathBuf::from(default))
}

fn load_report_settings() -> ReportSettings {
    let rerun = parse_i32("FORKLINK_RERUN_COUNT", 0);
    let rerun = rerun.max(0); // floor: reruns cannot be negative
    ReportSettings {
        use_file: parse_bool("FORKLINK_USE_FILE", true),
        print_summary: parse_bool("FORKLINK_PRINT_SUMMARY", true),
        report_format: parse_string("FORKLINK_REPORT_FORMAT", "brief"),
        redirect_output_to_file: parse_bool("FORKLINK_REDIRECT_OUTPUT", false),
        disable_xml_report: parse_bool("FORKLINK_DISABLE_XML_REPORT", false),
        reports_directory: parse_path("FORKLINK_REPORTS_DIR", "reports"),
        trim_stack_trace: parse_bool("FORKLINK_TRIM_STACKTRACE", true),
        report_name_suffix: parse_string("FORKLINK_REPORT_NAME_SUFFIX", ""),
        statistics_file: parse_path("FORKLINK_STATISTICS_FILE", "reports/statistics.txt"),
        requires_run_history: parse_bool("FORKLINK_RUN_HISTORY", false),
        rerun_failing_tests_count: rerun,
        xsd_schema_location: parse_string("FORKLINK_XSD_SCHEMA", ""),
        encoding_name: parse_string("FORKLINK_ENCODING", "UTF-8"),
    }
}

/// Load all configuration from environment variables.
///
/// Missing or invalid values fall back to safe defaults without panicking.
pub fn load() -> EnvConfig {
    let log_format = match parse_string("FORKLINK_LOG_FORMAT", "json").as_str() {
        "pretty" => LogFormat::Pretty,
        _ => LogFormat::Json,
    };
    EnvConfig {
        report: load_report_settings(),
        log_level: parse_string("FORKLINK_LOG_LEVEL", "info"),
        log_format,
    }
}

impl EnvConfig {
    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            use_file: self.report.use_file,
            print_summary: self.report.print_summary,
            report_format: self.report.report_format.clone(),
            redirect_output_to_file: self.report.redirect_output_to_file,
            disable_xml_report: self.report.disable_xml_report,
            reports_directory: self.report.reports_directory.clone(),
            trim_stack_trace: self.report.trim_stack_trace,
            report_name_suffix: self.report.report_name_suffix.clone(),
            statistics_file: self.report.statistics_file.clone(),
            requires_run_history: self.report.requires_run_history,
            rerun_failing_tests_count: self.report.rerun_failing_tests_count,
            xsd_schema_location: self.report.xsd_schema_location.clone(),
            encoding_name: self.report.encoding_name.clone(),
            log_level: self.log_level.clone(),
            log_format: match self.log_format {
                LogFormat::Json => "json".to_string(),
                LogFormat::Pretty => "pretty".to_string(),
            },
        }
    }
}
