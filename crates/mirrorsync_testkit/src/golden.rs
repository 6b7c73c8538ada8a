//! Golden test utilities for wire format verification.
//!
//! Compares encoded messages against files on disk. Set `UPDATE_GOLDEN` to
//! rewrite the files instead of comparing.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A golden test that compares output against expected files.
pub struct GoldenTest {
    name: String,
    golden_dir: PathBuf,
    update_mode: bool,
    _scratch: Option<TempDir>,
}

impl GoldenTest {
    /// Creates a golden test reading files from `golden_dir`.
    pub fn new(name: impl Into<String>, golden_dir: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            golden_dir: golden_dir.as_ref().to_path_buf(),
            update_mode: std::env::var("UPDATE_GOLDEN").is_ok(),
            _scratch: None,
        }
    }

    /// Creates a golden test over a fresh temporary directory, removed on
    /// drop.
    pub fn scratch(name: impl Into<String>) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let mut test = Self::new(name, dir.path());
        test._scratch = Some(dir);
        test
    }

    /// Forces update mode on or off, ignoring the environment.
    #[must_use]
    pub fn with_update_mode(mut self, update: bool) -> Self {
        self.update_mode = update;
        self
    }

    /// Directory holding the golden files.
    pub fn dir(&self) -> &Path {
        &self.golden_dir
    }

    /// Asserts that the given bytes match the golden file.
    pub fn assert_bytes(&self, suffix: &str, actual: &[u8]) {
        let path = self.file_path(suffix);

        if self.update_mode {
            self.update_golden_file(&path, actual);
            return;
        }

        if !path.exists() {
            panic!(
                "Golden file not found: {:?}\n\
                 Run with UPDATE_GOLDEN=1 to create it.\n\
                 Actual bytes (hex): {}",
                path,
                hex_encode(actual)
            );
        }

        let expected = fs::read(&path).expect("Failed to read golden file");

        if actual != expected {
            panic!(
                "Golden test '{}' failed for '{}':\n\
                 Expected ({} bytes): {}\n\
                 Actual ({} bytes): {}\n\
                 Run with UPDATE_GOLDEN=1 to update.",
                self.name,
                suffix,
                expected.len(),
                hex_encode(&expected),
                actual.len(),
                hex_encode(actual)
            );
        }
    }

    /// Asserts that the given text matches the golden file.
    pub fn assert_text(&self, suffix: &str, actual: &str) {
        let path = self.file_path(suffix);

        if self.update_mode {
            self.update_golden_file(&path, actual.as_bytes());
            return;
        }

        let expected = fs::read_to_string(&path)
            .unwrap_or_else(|_| panic!("Golden file not found: {path:?}\nActual:\n{actual}"));

        if actual != expected {
            panic!(
                "Golden test '{}' failed for '{}':\n\
                 --- Expected ---\n{}\n\
                 --- Actual ---\n{}",
                self.name, suffix, expected, actual
            );
        }
    }

    fn file_path(&self, suffix: &str) -> PathBuf {
        let filename = if suffix.is_empty() {
            format!("{}.golden", self.name)
        } else {
            format!("{}_{}.golden", self.name, suffix)
        };
        self.golden_dir.join(filename)
    }

    fn update_golden_file(&self, path: &Path, data: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create golden directory");
        }
        fs::write(path, data).expect("Failed to write golden file");
    }
}

/// Encodes bytes as a lowercase hexadecimal string.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decodes a hexadecimal string, ignoring whitespace.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    let hex = hex.replace([' ', '\n', '\r'], "");
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_round_trip() {
        assert_eq!(hex_encode(&[0x00, 0xab, 0xff]), "00abff");
        assert_eq!(hex_decode("00 ab\nff"), vec![0x00, 0xab, 0xff]);
    }

    #[test]
    fn write_then_compare() {
        let writer = GoldenTest::scratch("delta").with_update_mode(true);
        writer.assert_bytes("point", &[0xa1, 0x61, 0x78, 0x05]);
        writer.assert_text("dump", "Point<complex> {}");

        let reader = GoldenTest::new("delta", writer.dir()).with_update_mode(false);
        reader.assert_bytes("point", &[0xa1, 0x61, 0x78, 0x05]);
        reader.assert_text("dump", "Point<complex> {}");
    }

    #[test]
    #[should_panic(expected = "Golden test 'delta' failed")]
    fn mismatch_panics() {
        let writer = GoldenTest::scratch("delta").with_update_mode(true);
        writer.assert_bytes("", &[0x01]);
        let reader = GoldenTest::new("delta", writer.dir()).with_update_mode(false);
        reader.assert_bytes("", &[0x02]);
    }
}
