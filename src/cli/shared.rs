use clap::Args;
use simple_error::{SimpleResult, bail};

#[derive(Args)]
pub struct SharedSettings {
    /// Number of threads to use. Defaults to all logical cpus detected.
    #[arg(long = "threads", global = true, value_name = "THREAD_COUNT")]
    thread_count_option: Option<usize>,

    /// Filled in from thread_count_option during validation
    #[arg(skip)]
    pub thread_count: usize,

    /// Overwrite an existing output directory
    #[arg(long, global = true)]
    pub clobber: bool,

    /// Turn on extra debug logging
    ///
    /// Adds a log message for each sub-tree split made during the pattern search, and for each
    /// completed chunk of regions.
    ///
    #[arg(long, global = true)]
    pub debug: bool,
}

pub fn validate_and_fix_shared_settings(
    mut settings: SharedSettings,
) -> SimpleResult<SharedSettings> {
    settings.thread_count = match settings.thread_count_option {
        Some(0) => bail!("--threads argument must be greater than 0"),
        Some(count) => count,
        None => num_cpus::get(),
    };

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_shared_settings(thread_count_option: Option<usize>) -> SharedSettings {
        SharedSettings {
            thread_count_option,
            thread_count: 0,
            clobber: false,
            debug: false,
        }
    }

    #[test]
    fn test_thread_count() {
        let settings = validate_and_fix_shared_settings(get_shared_settings(Some(4))).unwrap();
        assert_eq!(settings.thread_count, 4);

        let settings = validate_and_fix_shared_settings(get_shared_settings(None)).unwrap();
        assert!(settings.thread_count > 0);

        assert!(validate_and_fix_shared_settings(get_shared_settings(Some(0))).is_err());
    }
}
