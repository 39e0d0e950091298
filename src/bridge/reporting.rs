//! Reporting capability traits and the worker-side reporting types.
//!
//! The controller owns a [`ReportSettings`] snapshot and a logger capability;
//! the worker's loading space owns the concrete [`StartupReportConfig`] and
//! factory implementation. [`build_reporter_factory`] marshals the snapshot
//! across the boundary and returns the factory as an opaque
//! [`ReporterFactory`] handle.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::space::{BridgedInstance, LoadingSpace};
use super::value::{ArgValue, ConstructorSignature, ParamKind};
use super::BridgeError;
use crate::protocol::RunSummary;

/// Constructor schema version shared between controller and worker builds.
pub const REPORTING_SCHEMA_V1: u32 = 1;

/// Qualified name of the reporting configuration type.
pub const REPORT_CONFIG_TYPE: &str = "reporting.StartupReportConfig";

/// Qualified name of the reporter factory type.
pub const REPORTER_FACTORY_TYPE: &str = "reporting.ReporterFactory";

/// Schema of the reporting config constructor: the thirteen settings in
/// declared order. Changing order, arity, or version is a breaking schema
/// change and must bump [`REPORTING_SCHEMA_V1`].
pub const REPORT_CONFIG_SIGNATURE: ConstructorSignature = ConstructorSignature {
    schema_version: REPORTING_SCHEMA_V1,
    params: &[
        ParamKind::Bool, // use_file
        ParamKind::Bool, // print_summary
        ParamKind::Str,  // report_format
        ParamKind::Bool, // redirect_output_to_file
        ParamKind::Bool, // disable_xml_report
        ParamKind::Path, // reports_directory
        ParamKind::Bool, // trim_stack_trace
        ParamKind::Str,  // report_name_suffix
        ParamKind::Path, // statistics_file
        ParamKind::Bool, // requires_run_history
        ParamKind::Int,  // rerun_failing_tests_count
        ParamKind::Str,  // xsd_schema_location
        ParamKind::Str,  // encoding_name
    ],
};

/// Schema of the factory constructor: the nested config instance plus a
/// bridged logger capability.
pub const REPORTER_FACTORY_SIGNATURE: ConstructorSignature = ConstructorSignature {
    schema_version: REPORTING_SCHEMA_V1,
    params: &[ParamKind::Instance(REPORT_CONFIG_TYPE), ParamKind::Logger],
};

/// Narrow logger capability bridged into the worker's loading space.
pub trait ConsoleLogger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warning(&self, message: &str);
    fn error(&self, message: &str);
}

/// Routes bridged log calls into the ambient tracing stack.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingConsoleLogger;

impl ConsoleLogger for TracingConsoleLogger {
    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}

/// Capability interface the controller drives a bridged factory through.
///
/// The concrete implementation lives in the worker's loading space; the
/// controller never sees it.
pub trait ReporterFactory: Send + Sync {
    /// Hand a parsed run summary to the reporting pipeline.
    fn publish_summary(&self, summary: &RunSummary);

    /// Directory structured reports are written under.
    fn reports_directory(&self) -> &Path;
}

impl std::fmt::Debug for dyn ReporterFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReporterFactory").finish()
    }
}

/// Controller-owned snapshot of the thirteen report settings.
///
/// Immutable once handed to the bridge; marshalled positionally into
/// [`REPORT_CONFIG_SIGNATURE`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSettings {
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
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            use_file: true,
            print_summary: true,
            report_format: "brief".to_string(),
            redirect_output_to_file: false,
            disable_xml_report: false,
            reports_directory: PathBuf::from("reports"),
            trim_stack_trace: true,
            report_name_suffix: String::new(),
            statistics_file: PathBuf::from("reports/statistics.txt"),
            requires_run_history: false,
            rerun_failing_tests_count: 0,
            xsd_schema_location: String::new(),
            encoding_name: "UTF-8".to_string(),
        }
    }
}

impl ReportSettings {
    /// Marshal the thirteen fields in constructor order.
    pub fn to_args(&self) -> Vec<ArgValue> {
        vec![
            ArgValue::Bool(self.use_file),
            ArgValue::Bool(self.print_summary),
            ArgValue::Str(self.report_format.clone()),
            ArgValue::Bool(self.redirect_output_to_file),
            ArgValue::Bool(self.disable_xml_report),
            ArgValue::Path(self.reports_directory.clone()),
            ArgValue::Bool(self.trim_stack_trace),
            ArgValue::Str(self.report_name_suffix.clone()),
            ArgValue::Path(self.statistics_file.clone()),
            ArgValue::Bool(self.requires_run_history),
            ArgValue::Int(self.rerun_failing_tests_count),
            ArgValue::Str(self.xsd_schema_location.clone()),
            ArgValue::Str(self.encoding_name.clone()),
        ]
    }
}

/// Worker-side concrete reporting configuration.
///
/// Field order mirrors the constructor schema; the accessors read back exactly
/// what was marshalled in.
#[derive(Debug, Clone, PartialEq)]
pub struct StartupReportConfig {
    use_file: bool,
    print_summary: bool,
    report_format: String,
    redirect_output_to_file: bool,
    disable_xml_report: bool,
    reports_directory: PathBuf,
    trim_stack_trace: bool,
    report_name_suffix: String,
    statistics_file: PathBuf,
    requires_run_history: bool,
    rerun_failing_tests_count: i32,
    xsd_schema_location: String,
    encoding_name: String,
}

impl StartupReportConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        use_file: bool,
        print_summary: bool,
        report_format: String,
        redirect_output_to_file: bool,
        disable_xml_report: bool,
        reports_directory: PathBuf,
        trim_stack_trace: bool,
        report_name_suffix: String,
        statistics_file: PathBuf,
        requires_run_history: bool,
        rerun_failing_tests_count: i32,
        xsd_schema_location: String,
        encoding_name: String,
    ) -> Self {
        Self {
            use_file,
            print_summary,
            report_format,
            redirect_output_to_file,
            disable_xml_report,
            reports_directory,
            trim_stack_trace,
            report_name_suffix,
            statistics_file,
            requires_run_history,
            rerun_failing_tests_count,
            xsd_schema_location,
            encoding_name,
        }
    }

    pub fn use_file(&self) -> bool {
        self.use_file
    }

    pub fn print_summary(&self) -> bool {
        self.print_summary
    }

    pub fn report_format(&self) -> &str {
        &self.report_format
    }

    pub fn redirect_output_to_file(&self) -> bool {
        self.redirect_output_to_file
    }

    pub fn disable_xml_report(&self) -> bool {
        self.disable_xml_report
    }

    pub fn reports_directory(&self) -> &Path {
        &self.reports_directory
    }

    pub fn trim_stack_trace(&self) -> bool {
        self.trim_stack_trace
    }

    pub fn report_name_suffix(&self) -> &str {
        &self.report_name_suffix
    }

    pub fn statistics_file(&self) -> &Path {
        &self.statistics_file
    }

    pub fn requires_run_history(&self) -> bool {
        self.requires_run_history
    }

    pub fn rerun_failing_tests_count(&self) -> i32 {
        self.rerun_failing_tests_count
    }

    pub fn xsd_schema_location(&self) -> &str {
        &self.xsd_schema_location
    }

    pub fn encoding_name(&self) -> &str {
        &self.encoding_name
    }
}

/// Worker-side reporter factory implementation.
pub struct DefaultReporterFactory {
    config: StartupReportConfig,
    logger: Arc<dyn ConsoleLogger>,
}

impl DefaultReporterFactory {
    pub fn new(config: StartupReportConfig, logger: Arc<dyn ConsoleLogger>) -> Self {
        Self { config, logger }
    }

    pub fn config(&self) -> &StartupReportConfig {
        &self.config
    }
}

impl ReporterFactory for DefaultReporterFactory {
    fn publish_summary(&self, summary: &RunSummary) {
        if self.config.print_summary {
            self.logger.info(&format!(
                "Tests run: {}, failures: {}, ignored: {}, time: {} ms",
                summary.run_count, summary.failure_count, summary.ignore_count, summary.run_time_ms
            ));
        }
        if summary.failure_count > 0 && self.config.rerun_failing_tests_count > 0 {
            self.logger.warning(&format!(
                "{} failing tests eligible for {} rerun(s)",
                summary.failure_count, self.config.rerun_failing_tests_count
            ));
        }
    }

    fn reports_directory(&self) -> &Path {
        &self.config.reports_directory
    }
}

fn take(args: &mut std::vec::IntoIter<ArgValue>) -> Result<ArgValue, String> {
    args.next().ok_or_else(|| "constructor argument list exhausted".to_string())
}

/// Install the reporting types into a worker-side loading space.
pub fn install_reporting_types(space: &mut LoadingSpace) {
    space.register_constructor(REPORT_CONFIG_TYPE, REPORT_CONFIG_SIGNATURE, |args| {
        let mut args = args.into_iter();
        let config = StartupReportConfig::new(
            take(&mut args)?.into_bool()?,
            take(&mut args)?.into_bool()?,
            take(&mut args)?.into_str()?,
            take(&mut args)?.into_bool()?,
            take(&mut args)?.into_bool()?,
            take(&mut args)?.into_path()?,
            take(&mut args)?.into_bool()?,
            take(&mut args)?.into_str()?,
            take(&mut args)?.into_path()?,
            take(&mut args)?.into_bool()?,
            take(&mut args)?.into_int()?,
            take(&mut args)?.into_str()?,
            take(&mut args)?.into_str()?,
        );
        Ok(Box::new(config))
    });

    space.register_constructor(REPORTER_FACTORY_TYPE, REPORTER_FACTORY_SIGNATURE, |args| {
        let mut args = args.into_iter();
        let config_instance = take(&mut args)?.into_instance()?;
        let logger = take(&mut args)?.into_logger()?;
        let config = config_instance
            .downcast::<StartupReportConfig>()
            .map_err(|other| format!("instance '{}' is not a reporting config", other.type_name()))?;
        let factory: Arc<dyn ReporterFactory> =
            Arc::new(DefaultReporterFactory::new(*config, logger));
        Ok(Box::new(factory))
    });
}

/// Construct a reporter factory inside `space` from a controller-owned
/// settings snapshot and logger capability.
///
/// The nested config object is constructed first, then the factory taking the
/// config instance plus the logger as its two arguments. Any failure at any
/// step surfaces as a [`BridgeError`]; callers treat it as run-fatal, since a
/// run without a report sink has nowhere to put results.
pub fn build_reporter_factory(
    space: &LoadingSpace,
    settings: &ReportSettings,
    logger: Arc<dyn ConsoleLogger>,
) -> Result<Arc<dyn ReporterFactory>, BridgeError> {
    debug!(space = %space.name(), "bridging reporter factory");

    let config_type = space.resolve(REPORT_CONFIG_TYPE)?;
    let config_ctor = config_type.select_constructor(&REPORT_CONFIG_SIGNATURE)?;
    let config = config_ctor.instantiate(settings.to_args())?;

    let factory_type = space.resolve(REPORTER_FACTORY_TYPE)?;
    let factory_ctor = factory_type.select_constructor(&REPORTER_FACTORY_SIGNATURE)?;
    let instance =
        factory_ctor.instantiate(vec![ArgValue::Instance(config), ArgValue::Logger(logger)])?;

    unwrap_factory(instance)
}

fn unwrap_factory(instance: BridgedInstance) -> Result<Arc<dyn ReporterFactory>, BridgeError> {
    let type_name = instance.type_name().to_string();
    instance
        .downcast::<Arc<dyn ReporterFactory>>()
        .map(|factory| *factory)
        .map_err(|_| BridgeError::Instantiation {
            type_name,
            cause: "bridged value does not expose the reporter factory capability".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_marshal_thirteen_fields_in_order() {
        let args = ReportSettings::default().to_args();
        assert_eq!(args.len(), 13);
        for (arg, kind) in args.iter().zip(REPORT_CONFIG_SIGNATURE.params) {
            assert!(arg.satisfies(kind), "argument {:?} must satisfy {}", arg, kind);
        }
    }

    #[test]
    fn test_factory_signature_takes_config_then_logger() {
        assert_eq!(REPORTER_FACTORY_SIGNATURE.arity(), 2);
        assert_eq!(
            REPORTER_FACTORY_SIGNATURE.params[0],
            ParamKind::Instance(REPORT_CONFIG_TYPE)
        );
        assert_eq!(REPORTER_FACTORY_SIGNATURE.params[1], ParamKind::Logger);
    }

    #[test]
    fn test_install_registers_both_types() {
        let mut space = LoadingSpace::new("worker");
        install_reporting_types(&mut space);
        assert!(space.contains(REPORT_CONFIG_TYPE));
        assert!(space.contains(REPORTER_FACTORY_TYPE));
        assert_eq!(space.type_count(), 2);
    }
}
