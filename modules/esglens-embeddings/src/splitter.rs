//! Recursive character splitting: prefer paragraph breaks, then line
//! breaks, then spaces, then hard cuts, merging pieces back into chunks of
//! at most `chunk_size` bytes with `chunk_overlap` bytes carried between
//! consecutive chunks.

/// Separator preference order; the empty string means hard character cuts.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

/// A chunk positioned within its source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageChunk {
    pub page_number: i32,
    pub chunk_index: i32,
    pub text: String,
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        assert!(chunk_overlap < chunk_size, "overlap must be smaller than chunk_size");
        Self { chunk_size, chunk_overlap }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, rest) = pick_separator(text, separators);

        if separator.is_empty() {
            return self.hard_cut(text);
        }

        let splits = split_keeping_separator(text, separator);

        let mut chunks = Vec::new();
        let mut mergeable: Vec<String> = Vec::new();
        for piece in splits {
            if piece.len() <= self.chunk_size {
                mergeable.push(piece);
            } else {
                if !mergeable.is_empty() {
                    chunks.extend(self.merge(&mergeable));
                    mergeable.clear();
                }
                chunks.extend(self.split_recursive(&piece, rest));
            }
        }
        if !mergeable.is_empty() {
            chunks.extend(self.merge(&mergeable));
        }
        chunks
    }

    /// Merge small splits into chunks, carrying `chunk_overlap` bytes of
    /// trailing splits into the next chunk.
    fn merge(&self, splits: &[String]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for split in splits {
            if total + split.len() > self.chunk_size && !window.is_empty() {
                let chunk = window.concat().trim().to_string();
                if !chunk.is_empty() {
                    chunks.push(chunk);
                }
                while total > self.chunk_overlap
                    || (total + split.len() > self.chunk_size && total > 0)
                {
                    let removed = window.remove(0);
                    total -= removed.len();
                }
            }
            window.push(split);
            total += split.len();
        }

        let chunk = window.concat().trim().to_string();
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        chunks
    }

    /// Last resort: cut at byte offsets stepped by `chunk_size - overlap`,
    /// snapped to character boundaries.
    fn hard_cut(&self, text: &str) -> Vec<String> {
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0usize;
        while start < text.len() {
            let mut end = (start + self.chunk_size).min(text.len());
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            let piece = text[start..end].trim();
            if !piece.is_empty() {
                chunks.push(piece.to_string());
            }
            if end == text.len() {
                break;
            }
            let mut next = start + step;
            while next < text.len() && !text.is_char_boundary(next) {
                next += 1;
            }
            start = next;
        }
        chunks
    }
}

/// First separator that occurs in the text, with the rest kept for
/// recursion into oversized pieces.
fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

/// Split on `separator`, attaching it to the end of each preceding piece so
/// no bytes are lost.
fn split_keeping_separator(text: &str, separator: &str) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find(separator) {
        let end = pos + separator.len();
        pieces.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

/// Split each non-empty page into chunks. Chunk indices restart per page.
pub fn pages_to_chunks(
    pages: &[(i32, String)],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<PageChunk> {
    let splitter = RecursiveCharacterSplitter::new(chunk_size, chunk_overlap);
    let mut all = Vec::new();
    for (page_number, page_text) in pages {
        if page_text.trim().is_empty() {
            continue;
        }
        for (chunk_index, text) in splitter.split_text(page_text).into_iter().enumerate() {
            all.push(PageChunk {
                page_number: *page_number,
                chunk_index: chunk_index as i32,
                text,
            });
        }
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let splitter = RecursiveCharacterSplitter::new(100, 20);
        let chunks = splitter.split_text("just a short paragraph");
        assert_eq!(chunks, vec!["just a short paragraph".to_string()]);
    }

    #[test]
    fn prefers_paragraph_breaks() {
        let splitter = RecursiveCharacterSplitter::new(30, 0);
        let text = "first paragraph here\n\nsecond paragraph here";
        let chunks = splitter.split_text(text);
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("first paragraph"));
        assert!(chunks[1].starts_with("second paragraph"));
    }

    #[test]
    fn chunks_respect_size_bound() {
        let splitter = RecursiveCharacterSplitter::new(50, 10);
        let text = "word ".repeat(100);
        for chunk in splitter.split_text(&text) {
            assert!(chunk.len() <= 50, "chunk too long: {}", chunk.len());
        }
    }

    #[test]
    fn consecutive_chunks_overlap() {
        let splitter = RecursiveCharacterSplitter::new(40, 15);
        let text = "alpha beta gamma delta epsilon zeta eta theta iota kappa";
        let chunks = splitter.split_text(text);
        assert!(chunks.len() >= 2);
        // Some trailing words of each chunk reappear at the head of the next.
        for pair in chunks.windows(2) {
            let tail_word = pair[0].split_whitespace().last().unwrap();
            assert!(
                pair[1].contains(tail_word),
                "no overlap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn unbroken_text_falls_back_to_hard_cuts() {
        let splitter = RecursiveCharacterSplitter::new(10, 2);
        let text = "a".repeat(25);
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(chunk.len() <= 10);
        }
    }

    #[test]
    fn no_content_is_lost() {
        let splitter = RecursiveCharacterSplitter::new(32, 8);
        let text = "one two three\nfour five six\n\nseven eight nine ten eleven twelve";
        let joined = splitter.split_text(text).join(" ");
        for word in text.split_whitespace() {
            assert!(joined.contains(word), "missing {word}");
        }
    }

    #[test]
    fn empty_pages_are_skipped() {
        let pages = vec![
            (1, "content on page one".to_string()),
            (2, "   ".to_string()),
            (3, "content on page three".to_string()),
        ];
        let chunks = pages_to_chunks(&pages, 100, 10);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page_number, 1);
        assert_eq!(chunks[1].page_number, 3);
    }

    #[test]
    fn chunk_indices_restart_per_page() {
        let long = "sentence ".repeat(40);
        let pages = vec![(1, long.clone()), (2, long)];
        let chunks = pages_to_chunks(&pages, 100, 20);
        let page2_first = chunks.iter().find(|c| c.page_number == 2).unwrap();
        assert_eq!(page2_first.chunk_index, 0);
    }
}
