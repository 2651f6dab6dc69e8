use std::ops::Range;

/// Read-only view of a single version of a text, addressed by row and byte
/// offset. Rows are 0-based.
pub trait Document {
    /// The number of rows in the document. A document whose text is empty
    /// reports zero; a trailing `\n` introduces one final empty row.
    fn line_count(&self) -> u32;

    /// Byte offset of the first character of `row`.
    fn line_start_offset(&self, row: u32) -> usize;

    /// Byte offset past the last character of `row`, excluding the line
    /// terminator.
    fn line_end_offset(&self, row: u32) -> usize;

    /// Total length of the text in bytes.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn text_for_range(&self, range: Range<usize>) -> &str;
}

/// An immutable text with a precomputed row index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextDocument {
    text: String,
    line_starts: Vec<usize>,
}

impl TextDocument {
    /// Builds a document from `text`, normalizing CRLF and lone CR line
    /// terminators to `\n` first.
    pub fn new(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.contains('\r') {
            text = text.replace("\r\n", "\n").replace('\r', "\n");
        }

        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(offset, _)| offset + 1));
        Self { text, line_starts }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The text of `row`, without its terminator.
    pub fn line_text(&self, row: u32) -> &str {
        &self.text[self.line_start_offset(row)..self.line_end_offset(row)]
    }
}

impl Document for TextDocument {
    fn line_count(&self) -> u32 {
        if self.text.is_empty() {
            0
        } else {
            self.line_starts.len() as u32
        }
    }

    fn line_start_offset(&self, row: u32) -> usize {
        self.line_starts[row as usize]
    }

    fn line_end_offset(&self, row: u32) -> usize {
        let row = row as usize;
        match self.line_starts.get(row + 1) {
            Some(next_line_start) => next_line_start - 1,
            None => {
                assert!(row < self.line_starts.len(), "row {row} out of bounds");
                self.text.len()
            }
        }
    }

    fn len(&self) -> usize {
        self.text.len()
    }

    fn text_for_range(&self, range: Range<usize>) -> &str {
        &self.text[range]
    }
}

impl From<&str> for TextDocument {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn test_line_index() {
        let document = TextDocument::new("one\ntwo\nthree");
        assert_eq!(document.line_count(), 3);
        assert_eq!(document.len(), 13);
        assert_eq!(document.line_start_offset(0), 0);
        assert_eq!(document.line_end_offset(0), 3);
        assert_eq!(document.line_start_offset(1), 4);
        assert_eq!(document.line_end_offset(1), 7);
        assert_eq!(document.line_start_offset(2), 8);
        assert_eq!(document.line_end_offset(2), 13);
        assert_eq!(document.line_text(1), "two");
        assert_eq!(document.text_for_range(4..7), "two");
    }

    #[test]
    fn test_trailing_newline_adds_empty_row() {
        let document = TextDocument::new("one\ntwo\n");
        assert_eq!(document.line_count(), 3);
        assert_eq!(document.line_start_offset(2), 8);
        assert_eq!(document.line_end_offset(2), 8);
        assert_eq!(document.line_text(2), "");
    }

    #[test]
    fn test_empty_document() {
        let document = TextDocument::new("");
        assert_eq!(document.line_count(), 0);
        assert_eq!(document.len(), 0);
        assert_eq!(document.line_start_offset(0), 0);
        assert_eq!(document.line_end_offset(0), 0);
    }

    #[test]
    fn test_newline_only_document() {
        let document = TextDocument::new("\n");
        assert_eq!(document.line_count(), 2);
        assert_eq!(document.line_end_offset(0), 0);
        assert_eq!(document.line_start_offset(1), 1);
        assert_eq!(document.line_end_offset(1), 1);
    }

    #[test]
    fn test_line_ending_normalization() {
        let document = TextDocument::new("one\r\ntwo\rthree\n");
        assert_eq!(document.as_str(), "one\ntwo\nthree\n");
        assert_eq!(document.line_count(), 4);
        assert_eq!(document.line_text(1), "two");
        assert_eq!(document.line_text(2), "three");
    }

    #[test]
    fn test_random_documents() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            let line_count = rng.gen_range(0..10);
            let lines = (0..line_count)
                .map(|_| {
                    let len = rng.gen_range(0..8);
                    (0..len).map(|_| rng.gen_range('a'..='z')).collect::<String>()
                })
                .collect::<Vec<_>>();
            let mut text = lines.join("\n");
            if !text.is_empty() && rng.gen_bool(0.5) {
                text.push('\n');
            }

            let document = TextDocument::new(text.clone());
            let expected_rows = if text.is_empty() {
                Vec::new()
            } else {
                text.split('\n').map(str::to_owned).collect::<Vec<_>>()
            };

            assert_eq!(document.line_count() as usize, expected_rows.len());
            let mut offset = 0;
            for (row, expected) in expected_rows.iter().enumerate() {
                assert_eq!(document.line_start_offset(row as u32), offset);
                assert_eq!(document.line_end_offset(row as u32), offset + expected.len());
                assert_eq!(document.line_text(row as u32), expected);
                offset += expected.len() + 1;
            }
        }
    }
}
