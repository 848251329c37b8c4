use camino::Utf8Path;
use simple_error::{SimpleResult, bail};

/// Check that an input file path names an existing regular file
///
/// Assumes no logger has been configured yet
///
pub fn check_input_file(filename: &Utf8Path, label: &str) -> SimpleResult<()> {
    if filename.as_str().is_empty() {
        bail!("Must specify {label} file");
    }
    if !filename.exists() {
        bail!("Can't find specified {label} file: '{filename}'");
    }
    if !filename.is_file() {
        bail!("Specified {label} file path does not appear to be a file: '{filename}'");
    }
    Ok(())
}

pub fn check_optional_input_file(filename: Option<&Utf8Path>, label: &str) -> SimpleResult<()> {
    match filename {
        Some(filename) => check_input_file(filename, label),
        None => Ok(()),
    }
}
