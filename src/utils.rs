use std::fs::File;
use std::io::{BufRead, BufReader};

use camino::Utf8Path;
use flate2::read::MultiGzDecoder;
use simple_error::{SimpleResult, map_err_with};

/// Open a text input file for buffered reading, decompressing it if the filename ends in '.gz'
///
/// * `label` - used to describe the file in an error message
///
pub fn open_text_reader(filename: &Utf8Path, label: &str) -> SimpleResult<Box<dyn BufRead>> {
    let file = map_err_with!(
        File::open(filename),
        "Unable to open {label} file: '{filename}'"
    )?;
    let reader: Box<dyn BufRead> = if filename.extension() == Some("gz") {
        Box::new(BufReader::new(MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };
    Ok(reader)
}

/// Index of the maximum value, the first index is returned for ties
///
/// NaN values are never selected unless all values are NaN.
///
pub fn first_max_index(values: impl IntoIterator<Item = f64>) -> Option<usize> {
    let mut max: Option<(usize, f64)> = None;
    for (index, value) in values.into_iter().enumerate() {
        let is_new_max = match max {
            None => true,
            Some((_, max_value)) => {
                value > max_value || (max_value.is_nan() && !value.is_nan())
            }
        };
        if is_new_max {
            max = Some((index, value));
        }
    }
    max.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::{Read, Write};

    use camino::Utf8PathBuf;
    use flate2::{Compression, write::GzEncoder};

    #[test]
    fn test_open_text_reader_gz() {
        let temp_dir = Utf8PathBuf::try_from(std::env::temp_dir()).unwrap();
        let filename = temp_dir.join(format!("dmrtree_utils_test_{}.txt.gz", std::process::id()));
        {
            let f = File::create(&filename).unwrap();
            let mut encoder = GzEncoder::new(f, Compression::default());
            encoder.write_all(b"a\tb\n1\t2\n").unwrap();
            encoder.finish().unwrap();
        }

        let mut content = String::new();
        open_text_reader(&filename, "test")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        std::fs::remove_file(&filename).unwrap();
        assert_eq!(content, "a\tb\n1\t2\n");
    }

    #[test]
    fn test_open_text_reader_missing() {
        assert!(open_text_reader(Utf8Path::new("/not/a/real/file.tsv"), "test").is_err());
    }

    #[test]
    fn test_first_max_index() {
        assert_eq!(first_max_index(Vec::<f64>::new()), None);
        assert_eq!(first_max_index([1.0, 3.0, 2.0, 3.0]), Some(1));
        assert_eq!(first_max_index([f64::NAN, -1.0, -2.0]), Some(1));
        assert_eq!(first_max_index([f64::NEG_INFINITY, -5.0]), Some(1));
    }
}
