//! Mapping byte offsets back to human-readable positions.

/// 1-based `(line, column)` of a byte offset in `source`.
///
/// Columns count characters, not bytes. Offsets past the end clamp to the
/// position just after the last character.
pub fn line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;

    for (index, ch) in source.char_indices() {
        if index >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}

/// The full text of the line containing `offset`, without its newline.
pub fn line_text(source: &str, offset: usize) -> &str {
    let offset = offset.min(source.len());
    let start = source[..offset].rfind('\n').map_or(0, |index| index + 1);
    let end = source[offset..]
        .find('\n')
        .map_or(source.len(), |index| offset + index);
    source[start..end].trim_end_matches('\r')
}
