//! Fixed-size text chunker with overlap.
//!
//! Sizes are measured in characters, never bytes, so multi-byte text is
//! never split inside a code point. A window that would end mid-word is
//! pulled back to the last whitespace in its second half.

/// Split `text` into chunks of at most `chunk_size` characters, with
/// consecutive chunks sharing up to `overlap` characters.
///
/// Chunks are trimmed; whitespace-only chunks are dropped. `overlap` must be
/// smaller than `chunk_size` (validated by config); larger values are
/// clamped so the window always advances.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    if chunk_size == 0 {
        return Vec::new();
    }

    // Byte offset of every char start, plus the end of the text.
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = offsets.len() - 1;
    let overlap = overlap.min(chunk_size - 1);

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total {
        let mut end = (start + chunk_size).min(total);

        if end < total {
            let min_end = start + chunk_size / 2;
            if let Some(ws) = (min_end..end)
                .rev()
                .find(|&i| text[offsets[i]..offsets[i + 1]].chars().all(char::is_whitespace))
            {
                end = ws + 1;
            }
        }

        let piece = text[offsets[start]..offsets[end]].trim();
        if !piece.is_empty() {
            chunks.push(piece.to_string());
        }

        if end >= total {
            break;
        }
        start = end.saturating_sub(overlap).max(start + 1);
    }

    chunks
}
