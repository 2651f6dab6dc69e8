mod row_map;

pub use row_map::{RowConvertor, RowConvertorBuilder};

use anyhow::{ensure, Result};
use document::Document;
use std::{mem, ops::Range};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Old,
    New,
}

impl Side {
    pub fn select<T>(self, old: T, new: T) -> T {
        match self {
            Side::Old => old,
            Side::New => new,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Side::Old => Side::New,
            Side::New => Side::Old,
        }
    }
}

/// One hunk of a precomputed line diff, expressed as half-open row ranges on
/// each side. Either range may be empty, representing a pure insertion or
/// deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedRegion {
    pub old_rows: Range<u32>,
    pub new_rows: Range<u32>,
    /// Intra-line diff spans, when a fine-grained comparison produced them.
    pub inner_fragments: Option<Vec<InnerFragment>>,
}

impl ChangedRegion {
    pub fn new(old_rows: Range<u32>, new_rows: Range<u32>) -> Self {
        Self {
            old_rows,
            new_rows,
            inner_fragments: None,
        }
    }

    pub fn with_inner_fragments(mut self, fragments: Vec<InnerFragment>) -> Self {
        self.inner_fragments = Some(fragments);
        self
    }
}

/// A word- or character-level diff span inside one changed region. Offsets
/// are relative to the region's own old and new text. These are carried
/// through to [`ChangedBlock`]s verbatim, never reinterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerFragment {
    pub old_range: Range<usize>,
    pub new_range: Range<usize>,
}

/// Records that a byte range of the composite text was copied verbatim from
/// a byte range of one original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRange {
    pub side: Side,
    pub composite_range: Range<usize>,
    pub original_range: Range<usize>,
}

/// One changed region resolved to composite coordinates: the old text and the
/// new text appear one after the other inside `composite_rows`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedBlock {
    pub old_composite_range: Range<usize>,
    pub new_composite_range: Range<usize>,
    pub composite_rows: Range<u32>,
    pub inner_fragments: Option<Vec<InnerFragment>>,
}

/// Merges two versions of a text and their changed regions into a single
/// composite text for a one-column diff view. Unchanged spans are emitted
/// once, from the master side; changed spans are emitted from both sides in
/// sequence. The builder is consumed by [`build`](Self::build).
pub struct CompositeDiffBuilder<'a, D: Document> {
    old: &'a D,
    new: &'a D,
    regions: Vec<ChangedRegion>,
    master_side: Side,
    include_inner_fragments: bool,

    text: String,
    blocks: Vec<ChangedBlock>,
    highlight_ranges: Vec<HighlightRange>,
    convertor: RowConvertorBuilder,
    equal_row_ranges: Vec<Range<u32>>,
    row_count: u32,
}

/// The first row of each side not yet emitted into the composite text.
#[derive(Clone, Copy, Debug, Default)]
struct WalkCursor {
    next_old_row: u32,
    next_new_row: u32,
}

impl<'a, D: Document> CompositeDiffBuilder<'a, D> {
    pub fn new(
        old: &'a D,
        new: &'a D,
        regions: Vec<ChangedRegion>,
        master_side: Side,
        include_inner_fragments: bool,
    ) -> Self {
        Self {
            old,
            new,
            regions,
            master_side,
            include_inner_fragments,
            text: String::new(),
            blocks: Vec::new(),
            highlight_ranges: Vec::new(),
            convertor: RowConvertorBuilder::default(),
            equal_row_ranges: Vec::new(),
            row_count: 0,
        }
    }

    pub fn build(mut self) -> Result<CompositeDiff> {
        self.validate_regions()?;

        log::trace!(
            "building composite diff: {} changed regions, master side {:?}",
            self.regions.len(),
            self.master_side
        );

        let regions = mem::take(&mut self.regions);
        let is_equal = regions.is_empty();

        let mut cursor = WalkCursor::default();
        for region in regions {
            self.append_equal_span(cursor, region.old_rows.start, region.new_rows.start);
            cursor = self.append_changed_region(cursor, region);
        }
        self.append_equal_span(
            cursor,
            normalized_line_count(self.old),
            normalized_line_count(self.new),
        );

        Ok(CompositeDiff {
            is_equal,
            text: self.text,
            blocks: self.blocks,
            highlight_ranges: self.highlight_ranges,
            convertor: self.convertor.build(),
            equal_row_ranges: self.equal_row_ranges,
            row_count: self.row_count,
        })
    }

    fn validate_regions(&self) -> Result<()> {
        let old_rows = normalized_line_count(self.old);
        let new_rows = normalized_line_count(self.new);
        let mut last_old_row = 0;
        let mut last_new_row = 0;
        for (ix, region) in self.regions.iter().enumerate() {
            ensure!(
                region.old_rows.start <= region.old_rows.end
                    && region.new_rows.start <= region.new_rows.end,
                "changed region {ix} has an inverted row range: {region:?}"
            );
            ensure!(
                region.old_rows.end <= old_rows && region.new_rows.end <= new_rows,
                "changed region {ix} exceeds document bounds \
                 ({old_rows} old rows, {new_rows} new rows): {region:?}"
            );
            ensure!(
                region.old_rows.start >= last_old_row && region.new_rows.start >= last_new_row,
                "changed region {ix} is not sorted after its predecessor: {region:?}"
            );
            ensure!(
                region.old_rows.start - last_old_row == region.new_rows.start - last_new_row,
                "changed region {ix} implies an equal span of different lengths on each side: \
                 {region:?}"
            );
            last_old_row = region.old_rows.end;
            last_new_row = region.new_rows.end;
        }
        Ok(())
    }

    /// Emits the unchanged rows between `cursor` and the given end rows,
    /// reading the text from the master side. Registers the span with the
    /// row convertor for both sides. Does nothing when the span is empty.
    fn append_equal_span(&mut self, cursor: WalkCursor, old_end_row: u32, new_end_row: u32) {
        let (start_row, end_row) = match self.master_side {
            Side::Old => (cursor.next_old_row, old_end_row),
            Side::New => (cursor.next_new_row, new_end_row),
        };
        if end_row <= start_row {
            return;
        }

        let document = self.master_side.select(self.old, self.new);
        let start_offset = document.line_start_offset(start_row);
        let end_offset = document.line_end_offset(end_row - 1);

        let rows_before = self.row_count;
        self.append_span(
            self.master_side,
            start_offset,
            end_offset,
            end_row - start_row,
            Some(cursor.next_old_row),
            Some(cursor.next_new_row),
        );
        self.equal_row_ranges.push(rows_before..self.row_count);
    }

    /// Emits one changed region: the old rows first, then the new rows, each
    /// registered with the row convertor for its own side only.
    fn append_changed_region(&mut self, cursor: WalkCursor, region: ChangedRegion) -> WalkCursor {
        let ChangedRegion {
            old_rows,
            new_rows,
            inner_fragments,
        } = region;
        debug_assert!(cursor.next_old_row <= old_rows.start);
        debug_assert!(cursor.next_new_row <= new_rows.start);

        let rows_before = self.row_count;

        let old_start = self.text.len();
        if old_rows.end > old_rows.start {
            let start_offset = self.old.line_start_offset(old_rows.start);
            let end_offset = self.old.line_end_offset(old_rows.end - 1);
            self.append_span(
                Side::Old,
                start_offset,
                end_offset,
                old_rows.end - old_rows.start,
                Some(old_rows.start),
                None,
            );
        }
        let old_composite_range = old_start..self.text.len();

        let new_start = self.text.len();
        if new_rows.end > new_rows.start {
            let start_offset = self.new.line_start_offset(new_rows.start);
            let end_offset = self.new.line_end_offset(new_rows.end - 1);
            self.append_span(
                Side::New,
                start_offset,
                end_offset,
                new_rows.end - new_rows.start,
                None,
                Some(new_rows.start),
            );
        }
        let new_composite_range = new_start..self.text.len();

        self.blocks.push(ChangedBlock {
            old_composite_range,
            new_composite_range,
            composite_rows: rows_before..self.row_count,
            inner_fragments: if self.include_inner_fragments {
                inner_fragments
            } else {
                None
            },
        });

        WalkCursor {
            next_old_row: old_rows.end,
            next_new_row: new_rows.end,
        }
    }

    /// Copies `start_offset..end_offset` of one document into the composite
    /// text and records the bookkeeping for it. A synthetic newline is always
    /// appended so composite rows stay well-formed; it is counted in the
    /// highlight range only when the source document continues past the line
    /// terminator, keeping the composite and original ranges the same length.
    fn append_span(
        &mut self,
        side: Side,
        start_offset: usize,
        end_offset: usize,
        row_count: u32,
        old_start_row: Option<u32>,
        new_start_row: Option<u32>,
    ) {
        let document = side.select(self.old, self.new);
        let newline_len = if document.len() > end_offset + 1 { 1 } else { 0 };

        let composite_start = self.text.len();
        self.highlight_ranges.push(HighlightRange {
            side,
            composite_range: composite_start
                ..composite_start + (end_offset - start_offset) + newline_len,
            original_range: start_offset..end_offset + newline_len,
        });

        self.text
            .push_str(document.text_for_range(start_offset..end_offset));
        self.text.push('\n');

        if let Some(row) = old_start_row {
            self.convertor
                .append(Side::Old, self.row_count, row, row_count);
        }
        if let Some(row) = new_start_row {
            self.convertor
                .append(Side::New, self.row_count, row, row_count);
        }
        self.row_count += row_count;
    }
}

fn normalized_line_count<D: Document>(document: &D) -> u32 {
    document.line_count().max(1)
}

/// The immutable product of a [`CompositeDiffBuilder`].
#[derive(Debug)]
pub struct CompositeDiff {
    is_equal: bool,
    text: String,
    blocks: Vec<ChangedBlock>,
    highlight_ranges: Vec<HighlightRange>,
    convertor: RowConvertor,
    equal_row_ranges: Vec<Range<u32>>,
    row_count: u32,
}

impl CompositeDiff {
    /// Whether the two documents had no changed regions at all.
    pub fn is_equal(&self) -> bool {
        self.is_equal
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn blocks(&self) -> &[ChangedBlock] {
        &self.blocks
    }

    pub fn highlight_ranges(&self) -> &[HighlightRange] {
        &self.highlight_ranges
    }

    pub fn convertor(&self) -> &RowConvertor {
        &self.convertor
    }

    /// Composite row spans that hold unchanged text, for painting equal
    /// backgrounds.
    pub fn equal_row_ranges(&self) -> &[Range<u32>] {
        &self.equal_row_ranges
    }

    pub fn row_count(&self) -> u32 {
        self.row_count
    }
}

/// Asserts the old and new composite text of each block, in order.
#[cfg(any(test, feature = "test-support"))]
#[track_caller]
pub fn assert_blocks(diff: &CompositeDiff, expected: &[(&str, &str)]) {
    let actual = diff
        .blocks()
        .iter()
        .map(|block| {
            (
                &diff.text()[block.old_composite_range.clone()],
                &diff.text()[block.new_composite_range.clone()],
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(actual, expected);
}
