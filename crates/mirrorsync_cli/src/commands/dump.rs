//! Dump command implementation.

use super::read_message;
use mirrorsync_codec::{to_json, Value};
use std::fmt::Write as _;
use std::path::Path;
use tracing::warn;

/// Runs the dump command.
pub fn run(path: &Path, format: &str, roots: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let (bytes, value) = read_message(path)?;
    let value = select_roots(value, roots);

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&to_json(&value))?);
        }
        _ => {
            println!("{} bytes, {} entries", bytes.len(), value.map_len());
            println!("{}", render_tree(&value));
        }
    }

    Ok(())
}

/// Keeps only the named top-level entries. An empty list keeps everything.
fn select_roots(value: Value, roots: &[String]) -> Value {
    if roots.is_empty() {
        return value;
    }
    let pairs = match value {
        Value::Map(pairs) => pairs,
        other => {
            warn!(kind = other.kind(), "message is not a map; ignoring --root");
            return other;
        }
    };
    for root in roots {
        if !pairs.iter().any(|(k, _)| k.as_text() == Some(root.as_str())) {
            warn!(root = %root, "root not present in message");
        }
    }
    Value::Map(
        pairs
            .into_iter()
            .filter(|(k, _)| k.as_text().is_some_and(|name| roots.iter().any(|r| r == name)))
            .collect(),
    )
}

/// Renders a message as an indented tree, one entry per line.
pub fn render_tree(value: &Value) -> String {
    let mut out = String::new();
    render(value, 0, &mut out);
    out
}

fn render(value: &Value, indent: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => {
            let _ = write!(out, "{b}");
        }
        Value::Integer(n) => {
            let _ = write!(out, "{n}");
        }
        Value::Float(x) => {
            let _ = write!(out, "{x:?}");
        }
        Value::Text(s) => {
            let _ = write!(out, "{s:?}");
        }
        Value::Bytes(b) => {
            out.push_str("h'");
            for byte in b {
                let _ = write!(out, "{byte:02x}");
            }
            out.push('\'');
        }
        Value::Array(items) if items.is_empty() => out.push_str("[]"),
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                line(out, indent + 1);
                let _ = write!(out, "{index}: ");
                render(item, indent + 1, out);
            }
            line(out, indent);
            out.push(']');
        }
        Value::Map(pairs) if pairs.is_empty() => out.push_str("{}"),
        Value::Map(pairs) => {
            out.push('{');
            for (key, item) in pairs {
                line(out, indent + 1);
                match key.as_text() {
                    Some(name) => out.push_str(name),
                    None => render(key, indent + 1, out),
                }
                out.push_str(": ");
                render(item, indent + 1, out);
            }
            line(out, indent);
            out.push('}');
        }
    }
}

fn line(out: &mut String, indent: usize) {
    out.push('\n');
    for _ in 0..indent {
        out.push_str("  ");
    }
}
