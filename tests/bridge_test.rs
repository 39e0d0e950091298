//! Cross-space construction tests for the reporting bridge.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use forklink::bridge::reporting::{
    StartupReportConfig, REPORT_CONFIG_SIGNATURE, REPORT_CONFIG_TYPE,
};
use forklink::bridge::value::ParamKind;
use forklink::bridge::{
    build_reporter_factory, install_reporting_types, BridgeError, ConsoleLogger,
    ConstructorSignature, LoadingSpace, ReportSettings,
};
use forklink::protocol::RunSummary;

/// Logger capability that records every message it receives.
#[derive(Default)]
struct RecordingLogger {
    messages: Mutex<Vec<String>>,
}

impl RecordingLogger {
    fn drain(&self) -> Vec<String> {
        self.messages.lock().unwrap().drain(..).collect()
    }
}

impl ConsoleLogger for RecordingLogger {
    fn debug(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("debug: {}", message));
    }

    fn info(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("info: {}", message));
    }

    fn warning(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("warning: {}", message));
    }

    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("error: {}", message));
    }
}

fn sample_settings(reports_dir: &std::path::Path) -> ReportSettings {
    ReportSettings {
        use_file: true,
        print_summary: true,
        report_format: "brief".to_string(),
        redirect_output_to_file: false,
        disable_xml_report: true,
        reports_directory: reports_dir.to_path_buf(),
        trim_stack_trace: false,
        report_name_suffix: "-it".to_string(),
        statistics_file: reports_dir.join("statistics.txt"),
        requires_run_history: true,
        rerun_failing_tests_count: 2,
        xsd_schema_location: "https://example.org/report.xsd".to_string(),
        encoding_name: "UTF-8".to_string(),
    }
}

fn installed_space() -> LoadingSpace {
    let mut space = LoadingSpace::new("worker");
    install_reporting_types(&mut space);
    space
}

#[test]
fn config_fields_read_back_through_foreign_accessors() {
    let reports = tempfile::tempdir().unwrap();
    let settings = sample_settings(reports.path());

    let space = installed_space();
    let instance = space
        .resolve(REPORT_CONFIG_TYPE)
        .unwrap()
        .select_constructor(&REPORT_CONFIG_SIGNATURE)
        .unwrap()
        .instantiate(settings.to_args())
        .unwrap();

    let config = instance.downcast::<StartupReportConfig>().unwrap();
    assert_eq!(config.use_file(), settings.use_file);
    assert_eq!(config.print_summary(), settings.print_summary);
    assert_eq!(config.report_format(), settings.report_format);
    assert_eq!(config.redirect_output_to_file(), settings.redirect_output_to_file);
    assert_eq!(config.disable_xml_report(), settings.disable_xml_report);
    assert_eq!(config.reports_directory(), settings.reports_directory);
    assert_eq!(config.trim_stack_trace(), settings.trim_stack_trace);
    assert_eq!(config.report_name_suffix(), settings.report_name_suffix);
    assert_eq!(config.statistics_file(), settings.statistics_file);
    assert_eq!(config.requires_run_history(), settings.requires_run_history);
    assert_eq!(config.rerun_failing_tests_count(), settings.rerun_failing_tests_count);
    assert_eq!(config.xsd_schema_location(), settings.xsd_schema_location);
    assert_eq!(config.encoding_name(), settings.encoding_name);
}

#[test]
fn resolution_fails_in_an_empty_space() {
    let space = LoadingSpace::new("empty-worker");
    let err = space.resolve(REPORT_CONFIG_TYPE).unwrap_err();
    assert!(matches!(err, BridgeError::TypeResolution { .. }));
}

#[test]
fn skewed_signature_never_constructs() {
    // A controller built against a newer schema version must fail loudly
    // without running any constructor body.
    let invoked = Arc::new(AtomicBool::new(false));
    let witness = invoked.clone();

    let mut space = LoadingSpace::new("worker");
    const NEWER: ConstructorSignature = ConstructorSignature {
        schema_version: 2,
        params: &[ParamKind::Bool],
    };
    space.register_constructor("reporting.Probe", NEWER, move |_args| {
        witness.store(true, Ordering::SeqCst);
        Ok(Box::new(()))
    });

    const OLDER: ConstructorSignature = ConstructorSignature {
        schema_version: 1,
        params: &[ParamKind::Bool],
    };
    let err = space
        .resolve("reporting.Probe")
        .unwrap()
        .select_constructor(&OLDER)
        .unwrap_err();

    assert!(matches!(err, BridgeError::SignatureMismatch { .. }));
    assert!(!invoked.load(Ordering::SeqCst), "constructor body must never run");
}

#[test]
fn reordered_parameters_are_a_mismatch() {
    let space = installed_space();
    const REORDERED: ConstructorSignature = ConstructorSignature {
        schema_version: 1,
        params: &[
            ParamKind::Str, // report_format moved first
            ParamKind::Bool,
            ParamKind::Bool,
            ParamKind::Bool,
            ParamKind::Bool,
            ParamKind::Path,
            ParamKind::Bool,
            ParamKind::Str,
            ParamKind::Path,
            ParamKind::Bool,
            ParamKind::Int,
            ParamKind::Str,
            ParamKind::Str,
        ],
    };
    let err = space
        .resolve(REPORT_CONFIG_TYPE)
        .unwrap()
        .select_constructor(&REORDERED)
        .unwrap_err();
    assert!(matches!(err, BridgeError::SignatureMismatch { .. }));
}

#[test]
fn factory_bridges_and_publishes_through_the_logger_capability() {
    let reports = tempfile::tempdir().unwrap();
    let settings = sample_settings(reports.path());
    let logger = Arc::new(RecordingLogger::default());

    let space = installed_space();
    let factory = build_reporter_factory(&space, &settings, logger.clone()).unwrap();
    assert_eq!(factory.reports_directory(), reports.path());

    let summary = RunSummary {
        run_count: 8,
        failure_count: 2,
        ignore_count: 1,
        run_time_ms: 95,
    };
    factory.publish_summary(&summary);

    let messages = logger.drain();
    assert!(messages.iter().any(|m| m.starts_with("info:") && m.contains("Tests run: 8")));
    // Two failures with rerun_failing_tests_count = 2 triggers the rerun note.
    assert!(messages.iter().any(|m| m.starts_with("warning:") && m.contains("rerun")));
}

#[test]
fn quiet_factory_skips_the_summary_line() {
    let reports = tempfile::tempdir().unwrap();
    let settings = ReportSettings {
        print_summary: false,
        rerun_failing_tests_count: 0,
        ..sample_settings(reports.path())
    };
    let logger = Arc::new(RecordingLogger::default());

    let space = installed_space();
    let factory = build_reporter_factory(&space, &settings, logger.clone()).unwrap();
    factory.publish_summary(&RunSummary::default());

    assert!(logger.drain().is_empty());
}

#[test]
fn bridge_failure_is_fatal_before_any_partial_construction() {
    let settings = ReportSettings {
        reports_directory: PathBuf::from("reports"),
        ..ReportSettings::default()
    };
    let logger = Arc::new(RecordingLogger::default());

    // A space missing the factory type: the config constructs, the factory
    // resolution fails, and the caller gets a single fatal error.
    let space_without_factory = {
        let mut partial = LoadingSpace::new("partial-worker");
        partial.register_constructor(
            REPORT_CONFIG_TYPE,
            REPORT_CONFIG_SIGNATURE,
            move |_args| Ok(Box::new(())),
        );
        partial
    };

    let err = build_reporter_factory(&space_without_factory, &settings, logger).unwrap_err();
    assert!(matches!(err, BridgeError::TypeResolution { .. }));
}
