// WHY: punctuation-delimited segments are the atoms of the segment-combination search

/// Characters that end a segment; they are dropped from the output
pub const SEGMENT_BOUNDARIES: &[char] = &['、', '。', '！', '？', '!', '?', '\n', '\r'];

/// True when the character closes the current segment
pub fn is_segment_boundary(c: char) -> bool {
    SEGMENT_BOUNDARIES.contains(&c)
}

/// Split clean text into ordered, non-empty segments.
///
/// Consecutive boundaries never produce empty segments. When no segment is
/// produced at all the whole input is returned as the single segment, so the
/// result is never empty.
pub fn segment(clean: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for ch in clean.chars() {
        if is_segment_boundary(ch) {
            if !current.is_empty() {
                segments.push(std::mem::take(&mut current));
            }
        } else {
            current.push(ch);
        }
    }

    if !current.is_empty() {
        segments.push(current);
    }

    if segments.is_empty() {
        segments.push(clean.to_string());
    }

    segments
}
