//! forklink-cli entry point.
//!
//! Controller- and worker-side commands around the reporting bridge:
//!
//! - `forklink-cli summarize` - parse a worker's protocol stream from stdin
//! - `forklink-cli check` - run the built-in smoke batch end to end (exit 0/1)
//! - `forklink-cli config` - show or validate `FORKLINK_*` configuration
//! - `forklink-cli version` - show version information

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::Arc;

use forklink::bridge::{build_reporter_factory, install_reporting_types, TracingConsoleLogger};
use forklink::config;
use forklink::listener::{run_named_tests, TestCase, TestCatalog, TestOutcome, TestUnit};
use forklink::logging;
use forklink::protocol::{self, RunSummary, SharedStream};
use forklink::LoadingSpace;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match command {
        "summarize" => {
            init_logging();
            let json = args.get(2).map(|s| s.as_str()) == Some("--json");
            ExitCode::from(run_summarize(json) as u8)
        }
        "check" => {
            init_logging();
            ExitCode::from(run_check() as u8)
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    run_config_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    run_config_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => ExitCode::from(run_config_validate() as u8),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    ExitCode::FAILURE
                }
            }
        }
        "version" | "--version" | "-V" => {
            println!("forklink {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let env = config::load();
    if let Err(e) = logging::init_from_env(&env) {
        eprintln!("Logging initialization failed: {}", e);
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "forklink - cross-space reporting bridge for forked test runs v{}

USAGE:
    forklink-cli [COMMAND] [OPTIONS]

COMMANDS:
    summarize    Parse a worker's protocol stream from stdin and report it
    check        Run the built-in smoke batch end to end (worker + controller)
    config       Manage configuration (show, defaults, validate)
    version      Show version information
    help         Show this help message

OPTIONS:
    -h, --help     Show this help message
    -V, --version  Show version information
    --json         JSON output (summarize)

EXAMPLES:
    worker-binary run-tests | forklink-cli summarize
    forklink-cli summarize --json < captured-output.txt
    forklink-cli check
    forklink-cli config validate

ENVIRONMENT:
    FORKLINK_REPORTS_DIR   Reports directory (default: reports)
    FORKLINK_RERUN_COUNT   Reruns for failing tests (default: 0)
    FORKLINK_LOG_LEVEL     Log level (debug, info, warn, error)
    FORKLINK_LOG_FORMAT    Log format (json, pretty)
    (see 'forklink-cli config defaults' for the full list)

EXIT CODES:
    0  Success / run passed
    1  Failure / run had failing tests
    2  Protocol or configuration error
",
        version
    );
}

/// Read a worker's shared output stream from stdin and report the summary.
///
/// Exit code mirrors the run outcome: 0 on success, 1 on failures, 2 when the
/// stream does not carry a complete summary.
fn run_summarize(json: bool) -> i32 {
    let stdin = io::stdin();
    let mut lines = Vec::new();
    for line in stdin.lock().lines() {
        match line {
            Ok(line) => lines.push(line),
            Err(e) => {
                eprintln!("Failed to read input stream: {}", e);
                return 2;
            }
        }
    }

    let summary = match protocol::parse_summary(lines.iter().map(String::as_str)) {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Incomplete protocol stream: {}", e);
            return 2;
        }
    };

    if json {
        match serde_json::to_string_pretty(&summary) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("Failed to serialize summary: {}", e);
                return 2;
            }
        }
    } else {
        println!(
            "Tests run: {}, Failures: {}, Ignored: {}, Time elapsed: {} ms",
            summary.run_count, summary.failure_count, summary.ignore_count, summary.run_time_ms
        );
    }

    if summary.was_successful() {
        0
    } else {
        1
    }
}

/// Run the built-in smoke batch through both halves of the bridge: the worker
/// half drives the standalone driver, the controller half parses the stream
/// and publishes it through a bridged reporter factory.
fn run_check() -> i32 {
    let env = config::load();

    let mut space = LoadingSpace::new("worker");
    install_reporting_types(&mut space);
    let factory = match build_reporter_factory(&space, &env.report, Arc::new(TracingConsoleLogger))
    {
        Ok(factory) => factory,
        Err(e) => {
            eprintln!("Bridge check failed: {}", e);
            return 1;
        }
    };

    let catalog = smoke_catalog();
    let identifiers: Vec<String> =
        vec!["forklink.smoke.Protocol".to_string(), "forklink.smoke.Counters".to_string()];

    let stream = SharedStream::new(Vec::new());
    let code = match run_named_tests(&catalog, &identifiers, &stream) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Smoke batch failed to start: {}", e);
            return 1;
        }
    };

    let buffer = stream.into_inner().unwrap_or_default();
    let text = String::from_utf8_lossy(&buffer);
    print!("{}", text);

    match protocol::parse_summary(text.lines()) {
        Ok(summary) => {
            factory.publish_summary(&summary);
            code
        }
        Err(e) => {
            eprintln!("Smoke stream is not a valid protocol stream: {}", e);
            2
        }
    }
}

/// Self-contained units exercising the protocol and counter paths.
fn smoke_catalog() -> TestCatalog {
    let mut catalog = TestCatalog::new();

    catalog.register(
        TestUnit::new("forklink.smoke.Protocol")
            .with_case(TestCase::new("summary_roundtrip", || {
                let expected = RunSummary {
                    run_count: 3,
                    failure_count: 1,
                    ignore_count: 2,
                    run_time_ms: 45,
                };
                let mut out = Vec::new();
                if let Err(e) = protocol::write_summary(&mut out, &expected) {
                    return TestOutcome::Failed(e.to_string());
                }
                let text = String::from_utf8_lossy(&out).to_string();
                match protocol::parse_summary(text.lines()) {
                    Ok(parsed) if parsed == expected => TestOutcome::Passed,
                    Ok(parsed) => {
                        TestOutcome::Failed(format!("summary changed in transit: {:?}", parsed))
                    }
                    Err(e) => TestOutcome::Failed(e.to_string()),
                }
            }))
            .with_case(TestCase::new("untagged_lines_skipped", || {
                match protocol::parse_line("plain test output") {
                    Ok(None) => TestOutcome::Passed,
                    other => TestOutcome::Failed(format!("unexpected parse: {:?}", other)),
                }
            })),
    );

    catalog.register(
        TestUnit::new("forklink.smoke.Counters")
            .with_case(TestCase::new("zero_summary_is_successful", || {
                if RunSummary::default().was_successful() {
                    TestOutcome::Passed
                } else {
                    TestOutcome::Failed("zero failures must be a success".to_string())
                }
            }))
            .with_case(TestCase::ignored("placeholder_for_history")),
    );

    catalog
}

fn run_config_show() {
    let cfg = config::load().effective_config();
    println!("FORKLINK_USE_FILE={}", cfg.use_file);
    println!("FORKLINK_PRINT_SUMMARY={}", cfg.print_summary);
    println!("FORKLINK_REPORT_FORMAT={}", cfg.report_format);
    println!("FORKLINK_REDIRECT_OUTPUT={}", cfg.redirect_output_to_file);
    println!("FORKLINK_DISABLE_XML_REPORT={}", cfg.disable_xml_report);
    println!("FORKLINK_REPORTS_DIR={}", cfg.reports_directory.display());
    println!("FORKLINK_TRIM_STACKTRACE={}", cfg.trim_stack_trace);
    println!("FORKLINK_REPORT_NAME_SUFFIX={}", cfg.report_name_suffix);
    println!("FORKLINK_STATISTICS_FILE={}", cfg.statistics_file.display());
    println!("FORKLINK_RUN_HISTORY={}", cfg.requires_run_history);
    println!("FORKLINK_RERUN_COUNT={}", cfg.rerun_failing_tests_count);
    println!("FORKLINK_XSD_SCHEMA={}", cfg.xsd_schema_location);
    println!("FORKLINK_ENCODING={}", cfg.encoding_name);
    println!("FORKLINK_LOG_LEVEL={}", cfg.log_level);
    println!("FORKLINK_LOG_FORMAT={}", cfg.log_format);
}

fn run_config_defaults() {
    // Documented defaults as constants; see config.rs for the parsing rules.
    println!("FORKLINK_USE_FILE=true");
    println!("FORKLINK_PRINT_SUMMARY=true");
    println!("FORKLINK_REPORT_FORMAT=brief");
    println!("FORKLINK_REDIRECT_OUTPUT=false");
    println!("FORKLINK_DISABLE_XML_REPORT=false");
    println!("FORKLINK_REPORTS_DIR=reports");
    println!("FORKLINK_TRIM_STACKTRACE=true");
    println!("FORKLINK_REPORT_NAME_SUFFIX=");
    println!("FORKLINK_STATISTICS_FILE=reports/statistics.txt");
    println!("FORKLINK_RUN_HISTORY=false");
    println!("FORKLINK_RERUN_COUNT=0");
    println!("FORKLINK_XSD_SCHEMA=");
    println!("FORKLINK_ENCODING=UTF-8");
    println!("FORKLINK_LOG_LEVEL=info");
    println!("FORKLINK_LOG_FORMAT=json");
}

/// Validate configuration for obvious misconfigurations.
///
/// Returns 0 if valid, 2 if any warnings are found.
fn run_config_validate() -> i32 {
    let cfg = config::load().effective_config();
    let mut warnings = 0;

    if cfg.report_format != "brief" && cfg.report_format != "plain" {
        eprintln!("WARNING: FORKLINK_REPORT_FORMAT '{}' is not a known format", cfg.report_format);
        warnings += 1;
    }

    if cfg.encoding_name.is_empty() {
        eprintln!("WARNING: FORKLINK_ENCODING is empty; reports need an encoding name");
        warnings += 1;
    }

    if cfg.reports_directory.as_os_str().is_empty() {
        eprintln!("WARNING: FORKLINK_REPORTS_DIR is empty");
        warnings += 1;
    }

    if warnings == 0 {
        println!("Configuration is valid.");
        0
    } else {
        2
    }
}
