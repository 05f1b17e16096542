use std::path::PathBuf;

use clap::{value_parser, Arg, ArgAction, Command};
use scene_dup_finder_lib::{
    ann::BackendKind, IngestOptions, SearchParams, WindowParams, DB_PATH_ENV_VAR,
    DEFAULT_DB_FILENAME, DEFAULT_INDEX_LEN, DEFAULT_MIN_PEAK_SPACING_SECS, DEFAULT_SCENE_CAP_SECS,
    DEFAULT_SEARCH_RADIUS, DEFAULT_SEARCH_STEP,
};

use super::app_cfg::{AppCfg, AppCommand, OutputFormat, ReportVerbosity};

const ABOUT: &str = "Find near-duplicate video files by comparing scene-structure fingerprints";

fn build_app() -> Command {
    let db_arg = Arg::new("db")
        .long("db")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .global(true)
        .help(format!(
            "Database path (default: ${DB_PATH_ENV_VAR}, then ./{DEFAULT_DB_FILENAME})"
        ));

    let quiet_arg = Arg::new("quiet")
        .long("quiet")
        .short('q')
        .action(ArgAction::SetTrue)
        .global(true)
        .help("Only print warnings and errors");

    let verbose_arg = Arg::new("verbose")
        .long("verbose")
        .short('v')
        .action(ArgAction::SetTrue)
        .global(true)
        .conflicts_with("quiet")
        .help("Print debug information");

    let ingest = Command::new("ingest")
        .about("Walk a directory and fingerprint every new video file")
        .arg(
            Arg::new("dir")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("Directory to walk recursively"),
        )
        .arg(
            Arg::new("exts")
                .long("exts")
                .value_delimiter(',')
                .num_args(1..)
                .help("File extensions to ingest (default: common video extensions)"),
        )
        .arg(
            Arg::new("spacing")
                .long("spacing")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .default_value(default_str(DEFAULT_MIN_PEAK_SPACING_SECS))
                .help("Minimum seconds between retained scene transitions"),
        );

    let search = Command::new("search")
        .about("Search the store for duplicate clusters and print them")
        .arg(
            Arg::new("len")
                .long("len")
                .value_parser(value_parser!(usize))
                .default_value(default_str(DEFAULT_INDEX_LEN as f64))
                .help("Scene gaps per search window"),
        )
        .arg(
            Arg::new("scene")
                .long("scene")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .default_value(default_str(DEFAULT_SCENE_CAP_SECS))
                .help("Cap on cumulative scene-gap seconds within a window"),
        )
        .arg(
            Arg::new("radius")
                .long("radius")
                .value_parser(value_parser!(f64))
                .default_value(default_str(DEFAULT_SEARCH_RADIUS))
                .help("L2 distance within which two windows match"),
        )
        .arg(
            Arg::new("step")
                .long("step")
                .value_parser(value_parser!(usize))
                .default_value(default_str(DEFAULT_SEARCH_STEP as f64))
                .help("Stride over window rows (1 visits every window)"),
        )
        .arg(
            Arg::new("trim-start")
                .long("trim-start")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .default_value("0")
                .help("Ignore this many seconds at the start of every file"),
        )
        .arg(
            Arg::new("trim-end")
                .long("trim-end")
                .value_name("SECONDS")
                .value_parser(value_parser!(f64))
                .default_value("0")
                .help("Ignore this many seconds at the end of every file"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .value_parser(value_parser!(BackendKind))
                .default_value("exact")
                .help("ANN backend: exact or hnsw"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .value_parser(["normal", "json"])
                .default_value("normal")
                .help("Cluster output format"),
        );

    let whitelist = Command::new("whitelist")
        .about("Record a group of files as legitimately similar")
        .arg(
            Arg::new("files")
                .required(true)
                .num_args(2..)
                .value_parser(value_parser!(PathBuf))
                .help("Two or more ingested files"),
        );

    let purge = Command::new("purge")
        .about("Report (or delete) records for missing files and orphan rows")
        .arg(
            Arg::new("delete")
                .long("delete")
                .action(ArgAction::SetTrue)
                .help("Actually delete; without this flag purge only reports"),
        );

    let fix_metadata = Command::new("fix-metadata")
        .about("Re-probe files with missing fps/duration and update their records");

    Command::new("scene-dup-finder")
        .about(ABOUT)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(db_arg)
        .arg(quiet_arg)
        .arg(verbose_arg)
        .subcommand(ingest)
        .subcommand(search)
        .subcommand(whitelist)
        .subcommand(purge)
        .subcommand(fix_metadata)
}

// clap wants default values as strings
fn default_str(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

pub fn parse_args() -> AppCfg {
    let matches = build_app().get_matches();

    let db_path = matches
        .get_one::<PathBuf>("db")
        .cloned()
        .or_else(|| std::env::var_os(DB_PATH_ENV_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILENAME));

    let verbosity = if matches.get_flag("quiet") {
        ReportVerbosity::Quiet
    } else if matches.get_flag("verbose") {
        ReportVerbosity::Verbose
    } else {
        ReportVerbosity::Default
    };

    let command = match matches.subcommand() {
        Some(("ingest", sub)) => {
            let mut opts = IngestOptions {
                min_peak_spacing_secs: *sub.get_one::<f64>("spacing").unwrap(),
                ..IngestOptions::default()
            };
            if let Some(exts) = sub.get_many::<String>("exts") {
                opts.exts = exts.cloned().collect();
            }
            AppCommand::Ingest {
                dir: sub.get_one::<PathBuf>("dir").unwrap().clone(),
                opts,
            }
        }

        Some(("search", sub)) => AppCommand::Search {
            params: SearchParams {
                radius: *sub.get_one::<f64>("radius").unwrap(),
                step: *sub.get_one::<usize>("step").unwrap(),
                window: WindowParams {
                    index_len: *sub.get_one::<usize>("len").unwrap(),
                    scene_cap_secs: *sub.get_one::<f64>("scene").unwrap(),
                    trim_start_secs: *sub.get_one::<f64>("trim-start").unwrap(),
                    trim_end_secs: *sub.get_one::<f64>("trim-end").unwrap(),
                },
                backend: *sub.get_one::<BackendKind>("backend").unwrap(),
            },
            format: match sub.get_one::<String>("format").unwrap().as_str() {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Normal,
            },
        },

        Some(("whitelist", sub)) => AppCommand::Whitelist {
            files: sub.get_many::<PathBuf>("files").unwrap().cloned().collect(),
        },

        Some(("purge", sub)) => AppCommand::Purge {
            delete: sub.get_flag("delete"),
        },

        Some(("fix-metadata", _)) => AppCommand::FixMetadata,

        _ => unreachable!("subcommand is required"),
    };

    AppCfg {
        db_path,
        verbosity,
        command,
    }
}
