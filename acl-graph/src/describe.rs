//! Human-readable dumps of the model for debugging.
//!
//! Output is nested, indented text with one field per line. Rendering is
//! deterministic: collections print in key order and nothing depends on
//! addresses or hashing.

const INDENT: &str = "  ";

/// Types that can render their state as nested text.
pub trait Describe {
    /// Append a rendering of `self` to `out`, starting at `depth` levels
    /// of indentation and omitting any field named in `excluding`.
    fn write_description(&self, out: &mut String, depth: usize, excluding: &[&str]);

    /// Render `self`, omitting any field named in `excluding`.
    fn describe(&self, excluding: &[&str]) -> String {
        let mut out = String::new();
        self.write_description(&mut out, 0, excluding);
        out
    }
}

/// Write `depth` levels of indentation.
pub(crate) fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Write a `name: value` line unless `name` is excluded.
pub(crate) fn field_line(
    out: &mut String,
    depth: usize,
    excluding: &[&str],
    name: &str,
    value: impl std::fmt::Display,
) {
    if is_excluded(excluding, name) {
        return;
    }
    indent(out, depth);
    out.push_str(name);
    out.push_str(": ");
    out.push_str(&value.to_string());
    out.push('\n');
}

pub(crate) fn is_excluded(excluding: &[&str], name: &str) -> bool {
    excluding.iter().any(|field| *field == name)
}
