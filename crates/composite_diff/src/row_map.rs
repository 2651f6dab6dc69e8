use crate::Side;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RowMapping {
    composite_row: u32,
    original_row: u32,
    row_count: u32,
}

impl RowMapping {
    fn contains_composite_row(&self, row: u32) -> bool {
        row >= self.composite_row && row - self.composite_row < self.row_count
    }

    fn contains_original_row(&self, row: u32) -> bool {
        row >= self.original_row && row - self.original_row < self.row_count
    }
}

/// An immutable, bidirectional mapping between composite rows and the rows of
/// the two original documents. Composite rows holding only the other side's
/// text have no mapping for this side.
#[derive(Clone, Debug, Default)]
pub struct RowConvertor {
    old: Vec<RowMapping>,
    new: Vec<RowMapping>,
}

impl RowConvertor {
    fn mappings(&self, side: Side) -> &[RowMapping] {
        side.select(&self.old, &self.new)
    }

    /// The original row shown at `composite_row`, if any text of `side` is
    /// shown there.
    pub fn to_original(&self, side: Side, composite_row: u32) -> Option<u32> {
        let mappings = self.mappings(side);
        let ix = mappings.partition_point(|mapping| mapping.composite_row <= composite_row);
        let mapping = mappings[..ix].last()?;
        mapping
            .contains_composite_row(composite_row)
            .then(|| mapping.original_row + (composite_row - mapping.composite_row))
    }

    /// The composite row showing `original_row` of `side`, if it is shown at
    /// all.
    pub fn to_composite(&self, side: Side, original_row: u32) -> Option<u32> {
        let mappings = self.mappings(side);
        let ix = mappings.partition_point(|mapping| mapping.original_row <= original_row);
        let mapping = mappings[..ix].last()?;
        mapping
            .contains_original_row(original_row)
            .then(|| mapping.composite_row + (original_row - mapping.original_row))
    }

    /// Like [`to_original`](Self::to_original), but rows without a mapping
    /// clip to the nearest mapped row at or before them. Rows before the
    /// first mapping clip to its first row.
    pub fn to_original_clipped(&self, side: Side, composite_row: u32) -> u32 {
        let mappings = self.mappings(side);
        let ix = mappings.partition_point(|mapping| mapping.composite_row <= composite_row);
        match mappings[..ix].last() {
            Some(mapping) => {
                let overshoot = (composite_row - mapping.composite_row).min(mapping.row_count - 1);
                mapping.original_row + overshoot
            }
            None => mappings.first().map_or(0, |mapping| mapping.original_row),
        }
    }

    /// Like [`to_composite`](Self::to_composite), but rows without a mapping
    /// clip to the nearest mapped row at or before them.
    pub fn to_composite_clipped(&self, side: Side, original_row: u32) -> u32 {
        let mappings = self.mappings(side);
        let ix = mappings.partition_point(|mapping| mapping.original_row <= original_row);
        match mappings[..ix].last() {
            Some(mapping) => {
                let overshoot = (original_row - mapping.original_row).min(mapping.row_count - 1);
                mapping.composite_row + overshoot
            }
            None => mappings.first().map_or(0, |mapping| mapping.composite_row),
        }
    }
}

/// Accumulates `(composite_row, original_row, row_count)` triples per side
/// while a composite text is built, then compiles them into a [`RowConvertor`].
/// Triples must arrive in increasing composite-row order.
#[derive(Debug, Default)]
pub struct RowConvertorBuilder {
    old: Vec<RowMapping>,
    new: Vec<RowMapping>,
}

impl RowConvertorBuilder {
    pub fn append(&mut self, side: Side, composite_row: u32, original_row: u32, row_count: u32) {
        assert!(row_count > 0, "empty row mappings must be skipped, not registered");
        let mappings = side.select(&mut self.old, &mut self.new);
        if let Some(last) = mappings.last() {
            assert!(
                composite_row >= last.composite_row + last.row_count
                    && original_row >= last.original_row + last.row_count,
                "row mappings must be registered in increasing order"
            );
        }
        mappings.push(RowMapping {
            composite_row,
            original_row,
            row_count,
        });
    }

    pub fn build(self) -> RowConvertor {
        RowConvertor {
            old: self.old,
            new: self.new,
        }
    }
}
