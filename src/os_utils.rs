//! Filesystem utilities
//!

use camino::Utf8Path;

/// Create a directory path if it does not exist already
///
/// * `label` - used to describe the directory in an error message
///
pub fn create_dir_all(dir: &Utf8Path, label: &str) {
    if dir.is_dir() {
        return;
    }
    if let Err(e) = std::fs::create_dir_all(dir) {
        panic!("Can't create new {label} directory at '{dir}': {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dir_all() {
        let temp_dir = Utf8Path::from_path(std::env::temp_dir().as_path())
            .unwrap()
            .join(format!("dmrtree_os_utils_test_{}", std::process::id()));
        let nested_dir = temp_dir.join("a").join("b");

        create_dir_all(&nested_dir, "test");
        assert!(nested_dir.is_dir());

        // Repeat creation of an existing directory is a no-op
        create_dir_all(&nested_dir, "test");
        assert!(nested_dir.is_dir());

        std::fs::remove_dir_all(&temp_dir).unwrap();
    }
}
