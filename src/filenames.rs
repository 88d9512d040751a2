use std::path::{Path, PathBuf};

pub type SegmentNum = u32;

/// Path of segment `index`: `dir/{prefix}{index}`.
pub fn segment_file_name<P: AsRef<Path>>(dir: P, prefix: &str, index: SegmentNum) -> PathBuf {
    dir.as_ref().join(format!("{}{}", prefix, index))
}

/// Returns the segment index encoded in `name`, if `name` is a segment file
/// for `prefix`.
pub fn parse_segment_file_name(prefix: &str, name: &str) -> Option<SegmentNum> {
    let suffix = name.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // "01" is not a name this crate writes
    if suffix.len() > 1 && suffix.starts_with('0') {
        return None;
    }
    suffix.parse().ok()
}
