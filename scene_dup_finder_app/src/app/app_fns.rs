use std::path::{Path, PathBuf};

use eyre::WrapErr;
use ffmpeg_frame_src::{FfmpegFrameIterRgb, FrameReaderBuilder, VideoInfo};
use scene_dup_finder_lib::{
    find_duplicates, ingest_dir, CancelFlag, DecodeFailure, FrameDecoder, Store, VideoMeta,
};

use super::{app_cfg::AppCommand, arg_parse, search_output, AppCfg, ReportVerbosity};

pub fn run_app() -> i32 {
    let cfg = arg_parse::parse_args();
    configure_logs(cfg.verbosity);

    match run_app_inner(&cfg) {
        Ok(()) => 0,
        Err(fatal_error) => {
            error!("fatal: {fatal_error}");
            if cfg.verbosity == ReportVerbosity::Verbose {
                for (depth, cause) in fatal_error.chain().skip(1).enumerate() {
                    error!("  {depth}: {cause}");
                }
            }
            1
        }
    }
}

fn run_app_inner(cfg: &AppCfg) -> eyre::Result<()> {
    let mut store = Store::open(&cfg.db_path)
        .wrap_err_with(|| format!("could not open database at {}", cfg.db_path.display()))?;

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())
            .wrap_err("could not install the Ctrl+C handler")?;
    }

    match &cfg.command {
        AppCommand::Ingest { dir, opts } => {
            if !dir.is_dir() {
                return Err(eyre::Report::msg(format!(
                    "not a directory: {}",
                    dir.display()
                )));
            }
            if !ffmpeg_frame_src::ffmpeg_and_ffprobe_are_callable() {
                return Err(eyre::Report::msg(
                    "ffmpeg and ffprobe must be installed and visible on the command line",
                ));
            }

            let report = ingest_dir(&mut store, &FfmpegDecoder, dir, opts, &cancel)?;
            if report.cancelled {
                info!("ingest pass cancelled by user");
            }
        }

        AppCommand::Search { params, format } => {
            let clusters = find_duplicates(&store, params, &cancel)?;
            if cancel.is_cancelled() {
                info!("search cancelled by user");
                return Ok(());
            }
            search_output::print_clusters(&clusters, *format)?;
        }

        AppCommand::Whitelist { files } => {
            let ids = files
                .iter()
                .map(|path| resolve_ingested(&store, path))
                .collect::<eyre::Result<Vec<_>>>()?;
            let added = store.whitelist_add(&ids)?;
            info!("whitelisted {} new pairs", added);
        }

        AppCommand::Purge { delete } => {
            let report = store.purge(!delete)?;
            search_output::print_purge_report(&report, *delete);
        }

        AppCommand::FixMetadata => {
            let stale = store.files_missing_metadata()?;
            info!("{} files with missing metadata", stale.len());
            for record in stale {
                match VideoInfo::new(&record.path) {
                    Ok(probe) => {
                        store.update_metadata(record.id, probe.fps(), probe.duration_secs())?;
                        info!("updated metadata for {}", record.path.display());
                    }
                    Err(e) => warn!("could not re-probe {}: {e}", record.path.display()),
                }
            }
        }
    }

    Ok(())
}

// The whole whitelist add is rejected if any listed file is unknown.
fn resolve_ingested(store: &Store, path: &Path) -> eyre::Result<i64> {
    let canonical = std::fs::canonicalize(path).unwrap_or_else(|_| PathBuf::from(path));
    store
        .lookup_id(&canonical)?
        .ok_or_else(|| eyre::Report::msg(format!("file is not in the store: {}", path.display())))
}

/// Production decoder: full-rate RGB frames from the ffmpeg command line.
struct FfmpegDecoder;

impl FrameDecoder for FfmpegDecoder {
    type Frame = image::RgbImage;
    type Frames = FfmpegFrameIterRgb;

    fn open(&self, path: &Path) -> Result<(Self::Frames, VideoMeta), DecodeFailure> {
        let (frames, info) = FrameReaderBuilder::new(path)
            .spawn_rgb()
            .map_err(|e| DecodeFailure(e.to_string()))?;

        let meta = VideoMeta {
            fps: info.fps(),
            duration_secs: info.duration_secs(),
        };
        Ok((frames, meta))
    }
}

fn configure_logs(verbosity: ReportVerbosity) {
    use simplelog::*;

    let min_loglevel = match verbosity {
        ReportVerbosity::Quiet => LevelFilter::Warn,
        ReportVerbosity::Default => LevelFilter::Info,
        ReportVerbosity::Verbose => LevelFilter::Trace,
    };

    TermLogger::init(
        min_loglevel,
        ConfigBuilder::new().build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
    .expect("TermLogger failed to initialize");
}
