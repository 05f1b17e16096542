mod app_cfg;
mod app_fns;
mod arg_parse;
mod search_output;

pub use app_cfg::{AppCfg, AppCommand, OutputFormat, ReportVerbosity};
pub use app_fns::run_app;
