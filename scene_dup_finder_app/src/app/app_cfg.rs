use std::path::PathBuf;

use scene_dup_finder_lib::{IngestOptions, SearchParams};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportVerbosity {
    Quiet,
    Default,
    Verbose,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Normal,
    Json,
}

#[derive(Debug)]
pub enum AppCommand {
    Ingest {
        dir: PathBuf,
        opts: IngestOptions,
    },
    Search {
        params: SearchParams,
        format: OutputFormat,
    },
    Whitelist {
        files: Vec<PathBuf>,
    },
    Purge {
        delete: bool,
    },
    FixMetadata,
}

#[derive(Debug)]
pub struct AppCfg {
    pub db_path: PathBuf,
    pub verbosity: ReportVerbosity,
    pub command: AppCommand,
}
