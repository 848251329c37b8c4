//! Program logger setup
//!

use camino::{Utf8Path, Utf8PathBuf};

use crate::cli;
use crate::globals::PROGRAM_NAME;
use crate::os_utils::create_dir_all;

fn get_log_filename(output_dir: &Utf8Path) -> Utf8PathBuf {
    output_dir.join(format!("{PROGRAM_NAME}.log"))
}

/// Log to stderr, and also to a log file in `output_dir` if given
///
/// If debug is true set the logger to the more verbose debug level
///
fn setup_logger(output_dir: Option<&Utf8Path>, debug: bool) -> Result<(), fern::InitError> {
    let level = if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    let mut logger = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                PROGRAM_NAME,
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr());

    if let Some(output_dir) = output_dir {
        logger = logger.chain(fern::log_file(get_log_filename(output_dir))?);
    }

    logger.apply()?;
    Ok(())
}

/// Check and create output directory, then setup logger to write there
///
/// An existing output directory is only reused when `clobber` is set.
///
pub fn setup_output_dir_and_logger(output_dir: &Utf8Path, clobber: bool, debug: bool) {
    // No logger exists yet, so errors follow the pattern of command-line setting validation
    if let Err(msg) = cli::check_novel_dirname(output_dir, "Output directory") {
        if !(clobber && output_dir.is_dir()) {
            eprintln!("Invalid command-line setting: {msg}");
            std::process::exit(exitcode::USAGE);
        }
    };
    create_dir_all(output_dir, "output");
    if let Err(err) = setup_logger(Some(output_dir), debug) {
        eprintln!("Unable to setup logger: {err}");
        std::process::exit(exitcode::CANTCREAT);
    }
}
