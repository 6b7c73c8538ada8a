//! Verify command implementation.

use mirrorsync_codec::{from_cbor, to_canonical_cbor};
use std::path::Path;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyResult {
    /// Size of the file in bytes.
    pub size: usize,
    /// Top-level entry names, for context messages.
    pub roots: Vec<String>,
    /// List of errors found.
    pub errors: Vec<String>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Runs the verify command.
pub fn run(path: &Path, max_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying message at {}", path.display());
    println!();

    let bytes = std::fs::read(path)?;
    let result = verify_bytes(&bytes, max_size);
    print_result(&result);

    if result.is_ok() {
        Ok(())
    } else {
        Err(format!("verification failed with {} error(s)", result.errors.len()).into())
    }
}

/// Checks that `bytes` hold exactly one canonical message within the limit.
pub fn verify_bytes(bytes: &[u8], max_size: usize) -> VerifyResult {
    let mut result = VerifyResult {
        size: bytes.len(),
        ..VerifyResult::default()
    };

    if bytes.len() > max_size {
        result
            .errors
            .push(format!("message is {} bytes, limit is {max_size}", bytes.len()));
    }

    let value = match from_cbor(bytes) {
        Ok(value) => value,
        Err(e) => {
            result.errors.push(format!("decode failed: {e}"));
            return result;
        }
    };

    match to_canonical_cbor(&value) {
        Ok(reencoded) if reencoded == bytes => {}
        Ok(_) => result
            .errors
            .push("message decodes but is not in canonical form".to_string()),
        Err(e) => result.errors.push(format!("re-encode failed: {e}")),
    }

    match value.as_map() {
        Some(pairs) => {
            for (key, _) in pairs {
                match key.as_text() {
                    Some(name) => result.roots.push(name.to_string()),
                    None => result
                        .errors
                        .push(format!("top-level key is {}, not a root name", key.kind())),
                }
            }
        }
        None => result
            .errors
            .push(format!("top level is {}, not a map of roots", value.kind())),
    }

    result
}

fn print_result(result: &VerifyResult) {
    println!("  Size: {} bytes", result.size);
    println!("  Roots: {}", result.roots.len());
    for root in &result.roots {
        println!("    {root}");
    }

    if result.is_ok() {
        println!("  Status: OK");
    } else {
        println!("  Status: FAILED");
        for error in &result.errors {
            println!("    - {error}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mirrorsync_codec::Value;

    #[test]
    fn canonical_context_message_passes() {
        let message = Value::object([
            ("board", Value::object([("turn", Value::Integer(1))])),
            ("alice", Value::empty_map()),
        ]);
        let bytes = to_canonical_cbor(&message).unwrap();
        let result = verify_bytes(&bytes, 1024);
        assert!(result.is_ok(), "{:?}", result.errors);
        assert_eq!(result.roots, vec!["alice".to_string(), "board".to_string()]);
    }

    #[test]
    fn non_canonical_integer_fails() {
        // {"a": 5} with the 5 in a two-byte head.
        let result = verify_bytes(&[0xa1, 0x61, 0x61, 0x18, 0x05], 1024);
        assert!(!result.is_ok());
    }

    #[test]
    fn oversize_and_non_map_fail() {
        let bytes = to_canonical_cbor(&Value::Array(vec![Value::Integer(1); 4])).unwrap();
        let result = verify_bytes(&bytes, 2);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn garbage_fails() {
        let result = verify_bytes(&[0xff], 1024);
        assert!(!result.is_ok());
        assert!(result.errors[0].starts_with("decode failed"));
    }

    #[test]
    fn run_reports_failure_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, [0xff]).unwrap();
        assert!(run(&path, 1024).is_err());

        let good = dir.path().join("good.bin");
        std::fs::write(&good, [0xa0]).unwrap();
        assert!(run(&good, 1024).is_ok());
    }
}
