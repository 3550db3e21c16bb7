//! Row storage for a terminal screen buffer.
//!
//! ## Design
//!
//! A row owns its text as a flat sequence of UTF-16 code units plus a
//! run-length column index (`cwid`) of equal length. `cwid` maps each code
//! unit to the number of columns it contributes: the first code unit of a
//! glyph carries the glyph's full width, and continuation code units carry
//! zero. A plain ASCII line is therefore a single `(1, width)` run, keeping
//! column addressing O(1) for the common case and O(k) for a line with `k`
//! width transitions.
//!
//! Overwrites are damage-aware: stomping half of a double-width glyph
//! repairs the orphaned half with spaces, so the row never exposes a torn
//! glyph. The attribute row is a parallel store kept width-aligned; text
//! damage repair does not rewrite attributes, the caller drives those
//! (see [`write_cells`](Row::write_cells)).

use std::iter::Peekable;

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::buffer::attr::{AttrRow, TextAttribute};
use crate::buffer::cell::Cell;
use crate::error::RowError;
use crate::rle::{Rle, Run};

/// UTF-16 code unit for the space character.
const SPACE: u16 = 0x20;

bitflags! {
    /// Row state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[repr(transparent)]
    pub struct RowFlags: u8 {
        /// The previous write overflowed this row and forced a wrap to the
        /// next line.
        const WRAP_FORCED = 1 << 0;
        /// The final column was padded because a double-width glyph did not
        /// fit.
        const DOUBLE_BYTE_PADDED = 1 << 1;
    }
}

/// Line rendition (DECDWL / DECDHL) for the whole row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineRendition {
    /// Single-width, single-height line (default).
    #[default]
    SingleWidthSingleHeight,
    /// Double-width line (single-height).
    DoubleWidthSingleHeight,
    /// Double-height line, top half.
    DoubleHeightTop,
    /// Double-height line, bottom half.
    DoubleHeightBottom,
}

/// Classification of a column within its glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbcsAttr {
    /// The column holds a single-width glyph.
    Single,
    /// First column of a multi-column glyph.
    Leading,
    /// Non-first column of a multi-column glyph.
    Trailing,
}

/// Classification of the glyph at a column, for double-click selection and
/// word navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterClass {
    /// Control character or space (code point at or below U+0020).
    ControlChar,
    /// A caller-defined word delimiter.
    DelimiterChar,
    /// Anything else.
    RegularChar,
}

/// Opaque handle to the buffer that owns this row.
///
/// Never dereferenced by the row engine; the owning buffer uses it to
/// recover its own bookkeeping without a reference cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BufferId(pub u32);

/// Result of resolving a column to its code-unit extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLookup {
    /// Code-unit offset of the glyph's first code unit.
    offset: usize,
    /// Code units in the glyph, trailers included.
    len: usize,
    /// How far into a multi-column glyph the queried column sits.
    offset_in_glyph: u16,
    /// Columns the glyph covers; 0 when the column is past the end.
    columns: u16,
}

/// A single row of the screen buffer.
///
/// The row reconciles three coordinate systems: columns (what the cursor
/// addresses), code units (what `data` contains), and glyphs (what the
/// terminal renders). Invariant: `cwid` always covers exactly `data.len()`
/// code units, and a freshly built row materializes all `width` columns as
/// spaces.
#[derive(Clone)]
pub struct Row {
    /// Text content, UTF-16 code units.
    data: Vec<u16>,
    /// Columns contributed per code unit; 0 marks trailer code units.
    cwid: Rle<u8>,
    /// Parallel per-column render attributes.
    attrs: AttrRow,
    /// Logical column count.
    width: u16,
    /// Line rendition for the whole row.
    line_rendition: LineRendition,
    /// Wrap / double-byte-pad state.
    flags: RowFlags,
    /// Rightmost column touched by a write since the last reset.
    max_right: u16,
    /// Handle of the owning buffer.
    parent: BufferId,
}

impl Row {
    /// Create a blank row of `width` columns filled with `fill`.
    ///
    /// Fails with `InvalidArgument` when `width` is zero.
    pub fn new(width: u16, fill: TextAttribute, parent: BufferId) -> Result<Self, RowError> {
        if width == 0 {
            return Err(RowError::InvalidArgument("row width must be nonzero"));
        }
        Ok(Self {
            data: vec![SPACE; usize::from(width)],
            cwid: Rle::from_run(1, width),
            attrs: AttrRow::new(width, fill),
            width,
            line_rendition: LineRendition::default(),
            flags: RowFlags::empty(),
            max_right: 0,
            parent,
        })
    }

    /// Logical column count.
    #[must_use]
    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    /// The entire text content as UTF-16 code units.
    #[must_use]
    #[inline]
    pub fn text(&self) -> &[u16] {
        &self.data
    }

    /// The column index mapping code units to the columns they contribute.
    #[must_use]
    #[inline]
    pub fn column_index(&self) -> &Rle<u8> {
        &self.cwid
    }

    /// The parallel attribute row.
    #[must_use]
    #[inline]
    pub fn attr_row(&self) -> &AttrRow {
        &self.attrs
    }

    /// Mutable access to the attribute row, for collaborators that repaint
    /// columns without rewriting text.
    #[inline]
    pub fn attr_row_mut(&mut self) -> &mut AttrRow {
        &mut self.attrs
    }

    /// Handle of the owning buffer.
    #[must_use]
    #[inline]
    pub fn parent(&self) -> BufferId {
        self.parent
    }

    /// Current line rendition.
    #[must_use]
    #[inline]
    pub fn line_rendition(&self) -> LineRendition {
        self.line_rendition
    }

    /// Set the line rendition.
    #[inline]
    pub fn set_line_rendition(&mut self, rendition: LineRendition) {
        self.line_rendition = rendition;
    }

    /// Check whether the last write on this row forced a wrap.
    #[must_use]
    #[inline]
    pub fn was_wrap_forced(&self) -> bool {
        self.flags.contains(RowFlags::WRAP_FORCED)
    }

    /// Set the wrap-forced flag.
    #[inline]
    pub fn set_wrap_forced(&mut self, wrap: bool) {
        self.flags.set(RowFlags::WRAP_FORCED, wrap);
    }

    /// Check whether the final column was padded for a double-width glyph.
    #[must_use]
    #[inline]
    pub fn was_double_byte_padded(&self) -> bool {
        self.flags.contains(RowFlags::DOUBLE_BYTE_PADDED)
    }

    /// Set the double-byte-padded flag.
    #[inline]
    pub fn set_double_byte_padded(&mut self, padded: bool) {
        self.flags.set(RowFlags::DOUBLE_BYTE_PADDED, padded);
    }

    /// Rightmost column touched by a write since the last reset.
    ///
    /// Renderers use this to skip the untouched tail of the row.
    #[must_use]
    #[inline]
    pub fn measure_right(&self) -> u16 {
        self.max_right
    }

    // ── Column resolution ───────────────────────────────────────────

    /// Resolve a column to the code-unit extent of the glyph covering it.
    ///
    /// Walks the column index run by run, tracking cumulative columns and
    /// code units. Trailer runs (value 0) cover no columns and are skipped
    /// by the walk; they are attached to the hit only when the hit is the
    /// final glyph of its run and the *next* run exists and is a trailer
    /// run.
    fn indices_for_col(&self, col: usize) -> ColumnLookup {
        let runs = self.cwid.runs();
        let mut current_col = 0usize;
        let mut current_cu = 0usize;
        let mut hit = None;
        for (i, run) in runs.iter().enumerate() {
            let cols_covered = usize::from(run.value) * usize::from(run.length);
            if current_col + cols_covered > col {
                hit = Some(i);
                break;
            }
            current_col += cols_covered;
            current_cu += usize::from(run.length);
        }

        let Some(i) = hit else {
            // A column we cannot answer for. The caller may still care where
            // the remaining data is; how many columns it covers we cannot
            // say, so `columns` is 0.
            return ColumnLookup {
                offset: current_cu,
                len: self.data.len() - current_cu,
                offset_in_glyph: 0,
                columns: 0,
            };
        };

        let run = &runs[i];
        let value = usize::from(run.value);
        // One code unit per `value` columns within this run; rounding down
        // lands on the glyph's first code unit.
        let cols_left = col - current_col;
        let offset = current_cu + cols_left / value;
        let mut len = 1usize;

        // Only the final glyph of the run can own trailers: a trailer run
        // directly follows the code units it continues.
        let cols_consumed = cols_left + value;
        let cols_covered = value * usize::from(run.length);
        if cols_consumed >= cols_covered {
            if let Some(next) = runs.get(i + 1) {
                if next.value == 0 {
                    len += usize::from(next.length);
                }
            }
        }

        ColumnLookup {
            offset,
            len,
            offset_in_glyph: (cols_left % value) as u16,
            columns: u16::from(run.value),
        }
    }

    /// The code units of the glyph occupying `col`.
    ///
    /// Any column of a multi-column glyph resolves to the same view. A
    /// column past the materialized end yields the (empty) tail view.
    #[must_use]
    pub fn glyph_at(&self, col: u16) -> &[u16] {
        let lookup = self.indices_for_col(usize::from(col));
        &self.data[lookup.offset..lookup.offset + lookup.len]
    }

    /// Classify `col` as single, leading, or trailing within its glyph.
    #[must_use]
    pub fn dbcs_attr_at(&self, col: u16) -> DbcsAttr {
        let lookup = self.indices_for_col(usize::from(col));
        if lookup.columns == 1 {
            DbcsAttr::Single
        } else if lookup.offset_in_glyph >= 1 {
            DbcsAttr::Trailing
        } else {
            DbcsAttr::Leading
        }
    }

    /// Classify the glyph at `col` for word navigation.
    ///
    /// Classification uses the glyph's first code unit: code points at or
    /// below U+0020 are control characters, members of `delimiters` are
    /// delimiters, everything else is a regular character.
    ///
    /// Fails with `InvalidArgument` when `col` is at or past the row width.
    pub fn delimiter_class_at(
        &self,
        col: u16,
        delimiters: &[u16],
    ) -> Result<DelimiterClass, RowError> {
        if col >= self.width {
            return Err(RowError::InvalidArgument("column out of range"));
        }
        let first = self.glyph_at(col).first().copied().unwrap_or(SPACE);
        if first <= SPACE {
            Ok(DelimiterClass::ControlChar)
        } else if delimiters.contains(&first) {
            Ok(DelimiterClass::DelimiterChar)
        } else {
            Ok(DelimiterClass::RegularChar)
        }
    }

    // ── Writes ──────────────────────────────────────────────────────

    /// Reinitialize the row to a blank line filled with `fill`.
    ///
    /// Clears the text, column index, attributes, flags, line rendition,
    /// and watermark. Returns `true` iff any state actually changed, so
    /// callers can suppress redundant redraws.
    pub fn reset(&mut self, fill: TextAttribute) -> bool {
        let width = usize::from(self.width);
        let pristine = self.data.len() == width
            && self.data.iter().all(|&cu| cu == SPACE)
            && self.cwid.run_count() == 1
            && self.cwid.runs()[0] == Run::new(1, self.width)
            && self.attrs.runs().len() == 1
            && self.attrs.runs()[0] == Run::new(fill, self.width)
            && self.flags.is_empty()
            && self.line_rendition == LineRendition::default()
            && self.max_right == 0;
        if pristine {
            return false;
        }
        self.data.clear();
        self.data.resize(width, SPACE);
        self.cwid = Rle::from_run(1, self.width);
        self.attrs.reset(self.width, fill);
        self.flags = RowFlags::empty();
        self.line_rendition = LineRendition::default();
        self.max_right = 0;
        true
    }

    /// Grow or shrink the row to `new_width` columns.
    ///
    /// Growth appends single-column spaces and extends the attribute row
    /// with its current trailing fill. Shrink truncates trailing cells
    /// (dropping a double-width glyph cut by the new edge entirely and
    /// repairing the gap with spaces) and clamps the watermark.
    ///
    /// Fails with `InvalidArgument` when `new_width` is zero. The row is
    /// unchanged on failure.
    pub fn resize(&mut self, new_width: u16) -> Result<(), RowError> {
        if new_width == 0 {
            return Err(RowError::InvalidArgument("row width must be nonzero"));
        }
        if new_width == self.width {
            return Ok(());
        }

        if new_width > self.width {
            let delta = new_width - self.width;
            let mut cwid = self.cwid.clone();
            let mut attrs = self.attrs.clone();
            cwid.extend_with(1, delta)?;
            attrs.resize(new_width)?;
            self.data.extend(std::iter::repeat(SPACE).take(usize::from(delta)));
            self.cwid = cwid;
            self.attrs = attrs;
            self.width = new_width;
            return Ok(());
        }

        // Shrink: cut at the first code unit of the glyph covering the new
        // edge. When the cut lands inside a wide glyph, the glyph is
        // dropped and the columns left of the edge become spaces.
        let lookup = self.indices_for_col(usize::from(new_width));
        let pad = usize::from(lookup.offset_in_glyph);
        let mut cwid = self.cwid.clone();
        let mut attrs = self.attrs.clone();
        cwid.resize_trailing_extent(lookup.offset)?;
        if pad > 0 {
            cwid.extend_with(1, lookup.offset_in_glyph)?;
        }
        attrs.resize(new_width)?;

        self.data.truncate(lookup.offset);
        self.data.extend(std::iter::repeat(SPACE).take(pad));
        self.cwid = cwid;
        self.attrs = attrs;
        self.width = new_width;
        self.max_right = self.max_right.min(new_width);
        Ok(())
    }

    /// Overwrite the glyph covering `col` with a single-column space.
    ///
    /// Partial overlap of a wide glyph is repaired with spaces on the side
    /// no longer covered.
    pub fn clear_column(&mut self, col: u16) -> Result<(), RowError> {
        if col >= self.width {
            return Err(RowError::InvalidArgument("column out of range"));
        }
        self.write_glyph_at_measured(col, 1, &[SPACE]).map(|_| ())
    }

    /// Write a measured glyph of `ncols` columns at `col`, repairing any
    /// damage to partially-overwritten neighbors with spaces.
    ///
    /// The glyph's first code unit takes the column count `ncols`; any
    /// further code units are stored as zero-width trailers. Returns the
    /// code-unit offset and the column just past the written glyph.
    ///
    /// This primitive does not touch the attribute row; the caller decides
    /// what color repaired cells take (see [`write_cells`](Self::write_cells)).
    ///
    /// Fails with `InvalidArgument` for a zero-width or empty glyph, a
    /// glyph wider than 255 columns, or a write extending past the
    /// materialized end of the row. The row is unchanged on failure.
    pub fn write_glyph_at_measured(
        &mut self,
        col: u16,
        ncols: u16,
        glyph: &[u16],
    ) -> Result<(usize, u16), RowError> {
        if ncols == 0 {
            return Err(RowError::InvalidArgument("glyph must cover at least one column"));
        }
        if glyph.is_empty() {
            return Err(RowError::InvalidArgument("glyph must contain at least one code unit"));
        }
        let ncols_value = u8::try_from(ncols)
            .map_err(|_| RowError::InvalidArgument("glyph width exceeds 255 columns"))?;

        let col = usize::from(col);
        let ncols = usize::from(ncols);

        let lookup = self.indices_for_col(col);
        if lookup.columns == 0 {
            return Err(RowError::InvalidArgument("column is past the end of the row"));
        }
        let begin = lookup.offset;
        let mut len = lookup.len;

        // Damage extent: everything from the left edge of the glyph we
        // partially overwrite to the right edge of the last glyph the new
        // one reaches into, advanced glyph by glyph so a run is never split
        // mid-glyph.
        let min_damage_col = col - usize::from(lookup.offset_in_glyph);
        let mut max_damage_col_excl = min_damage_col + usize::from(lookup.columns);
        while max_damage_col_excl < col + ncols {
            let next = self.indices_for_col(max_damage_col_excl);
            if next.columns == 0 {
                return Err(RowError::InvalidArgument("write extends past the end of the row"));
            }
            len += next.len;
            max_damage_col_excl += usize::from(next.columns);
        }

        let (left_pad, right_pad) = if min_damage_col == col && max_damage_col_excl == col + ncols {
            (0, 0)
        } else {
            (col - min_damage_col, max_damage_col_excl - (col + ncols))
        };

        // Build and validate the whole replacement plan before mutating.
        let mut new_runs: SmallVec<[Run<u8>; 4]> = SmallVec::new();
        if left_pad > 0 {
            let length = u16::try_from(left_pad)
                .map_err(|_| RowError::CapacityExceeded("run length overflows u16"))?;
            new_runs.push(Run::new(1, length));
        }
        new_runs.push(Run::new(ncols_value, 1));
        if glyph.len() > 1 {
            let length = u16::try_from(glyph.len() - 1)
                .map_err(|_| RowError::CapacityExceeded("run length overflows u16"))?;
            new_runs.push(Run::new(0, length));
        }
        if right_pad > 0 {
            let length = u16::try_from(right_pad)
                .map_err(|_| RowError::CapacityExceeded("run length overflows u16"))?;
            new_runs.push(Run::new(1, length));
        }

        self.cwid.replace(begin, begin + len, &new_runs)?;

        let mut replacement: Vec<u16> = Vec::with_capacity(left_pad + glyph.len() + right_pad);
        replacement.extend(std::iter::repeat(SPACE).take(left_pad));
        replacement.extend_from_slice(glyph);
        replacement.extend(std::iter::repeat(SPACE).take(right_pad));
        self.data.splice(begin..begin + len, replacement);

        // Degenerate tail: keep the column index exactly as long as the
        // text, padding with single-column entries.
        let data_len = self.data.len();
        let cwid_len = self.cwid.size();
        if cwid_len < data_len {
            let delta = u16::try_from(data_len - cwid_len)
                .map_err(|_| RowError::CapacityExceeded("run length overflows u16"))?;
            self.cwid.extend_with(1, delta)?;
        } else if cwid_len > data_len {
            self.cwid.resize_trailing_extent(data_len)?;
        }

        // The watermark tracks the damage extent, not just the new glyph:
        // the repair region to the right was touched too.
        self.max_right = self.max_right.max(max_damage_col_excl as u16);
        Ok((begin + glyph.len(), (col + ncols) as u16))
    }

    /// Ingest a stream of measured cells starting at `index`, advancing one
    /// cell at a time and painting the attribute row in lockstep.
    ///
    /// Stops when the stream is exhausted or when the next cell would pass
    /// `limit_right` (the row width when not supplied). A multi-column cell
    /// that no longer fits pads the remaining columns with spaces; at the
    /// row's own edge this also sets the double-byte-padded flag. Running
    /// out of room is ordinary termination, not an error: the iterator is
    /// handed back mid-sequence and the caller decides whether to wrap.
    ///
    /// When `wrap` is supplied, the wrap-forced flag is set to it.
    pub fn write_cells<I>(
        &mut self,
        mut it: Peekable<I>,
        index: u16,
        wrap: Option<bool>,
        limit_right: Option<u16>,
    ) -> Result<Peekable<I>, RowError>
    where
        I: Iterator<Item = Cell>,
    {
        if index >= self.width {
            return Err(RowError::InvalidArgument("write index out of range"));
        }
        let limit = limit_right.unwrap_or(self.width).min(self.width);

        let mut col = index;
        while col < limit {
            let (ncols, attr) = match it.peek() {
                Some(cell) => (cell.columns(), cell.attr()),
                None => break,
            };
            if ncols == 0 {
                return Err(RowError::InvalidArgument("cell must cover at least one column"));
            }
            if usize::from(col) + usize::from(ncols) > usize::from(limit) {
                // The next glyph no longer fits; fill the leftover columns
                // with spaces in its attribute.
                let pad = Cell::space(attr);
                while col < limit {
                    let (_, next_col) =
                        self.write_glyph_at_measured(col, pad.columns(), pad.glyph())?;
                    self.attrs.replace(col, next_col, pad.attr())?;
                    col = next_col;
                }
                if limit == self.width {
                    self.flags.insert(RowFlags::DOUBLE_BYTE_PADDED);
                }
                break;
            }
            let Some(cell) = it.next() else { break };
            let (_, next_col) = self.write_glyph_at_measured(col, cell.columns(), cell.glyph())?;
            self.attrs.replace(col, next_col, cell.attr())?;
            col = next_col;
        }

        if let Some(wrap) = wrap {
            self.set_wrap_forced(wrap);
        }
        Ok(it)
    }
}

impl std::fmt::Debug for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row")
            .field("width", &self.width)
            .field("max_right", &self.max_right)
            .field("flags", &self.flags)
            .field("rendition", &self.line_rendition)
            .field("text", &String::from_utf16_lossy(&self.data))
            .finish()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        // Line rendition and the watermark are render hints, not content.
        self.data == other.data
            && self.cwid == other.cwid
            && self.attrs == other.attrs
            && self.width == other.width
            && self.flags == other.flags
    }
}

impl Eq for Row {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::cell::cells;

    const HAN: u16 = 0x6F22; // 漢, double-width

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn row10() -> Row {
        Row::new(10, TextAttribute::default(), BufferId::default()).unwrap()
    }

    fn cwid_runs(row: &Row) -> Vec<(u8, u16)> {
        row.column_index().runs().iter().map(|r| (r.value, r.length)).collect()
    }

    #[test]
    fn new_row_is_blank() {
        let row = row10();
        assert_eq!(row.width(), 10);
        assert_eq!(row.text(), utf16("          ").as_slice());
        assert_eq!(cwid_runs(&row), vec![(1, 10)]);
        assert_eq!(row.measure_right(), 0);
        assert!(!row.was_wrap_forced());
        assert!(!row.was_double_byte_padded());
    }

    #[test]
    fn zero_width_row_is_rejected() {
        assert!(Row::new(0, TextAttribute::default(), BufferId::default()).is_err());
    }

    #[test]
    fn ascii_fill() {
        let mut row = row10();
        let it = cells("hello", TextAttribute::default()).peekable();
        let mut rest = row.write_cells(it, 2, None, None).unwrap();
        assert!(rest.next().is_none());

        assert_eq!(row.text(), utf16("  hello   ").as_slice());
        assert_eq!(cwid_runs(&row), vec![(1, 10)]);
        assert_eq!(row.measure_right(), 7);
        assert_eq!(row.glyph_at(4), utf16("l").as_slice());
        assert_eq!(row.dbcs_attr_at(4), DbcsAttr::Single);
    }

    #[test]
    fn round_trip_full_width() {
        let mut row = row10();
        let text = "0123456789";
        let it = cells(text, TextAttribute::default()).peekable();
        row.write_cells(it, 0, None, None).unwrap();
        for (i, ch) in text.chars().enumerate() {
            assert_eq!(row.glyph_at(i as u16), [ch as u16]);
        }
        assert_eq!(row.measure_right(), 10);
    }

    #[test]
    fn wide_write() {
        let mut row = row10();
        let (after_cu, after_col) = row.write_glyph_at_measured(3, 2, &[HAN]).unwrap();
        assert_eq!(after_cu, 4);
        assert_eq!(after_col, 5);

        assert_eq!(row.text().len(), 9);
        assert_eq!(cwid_runs(&row), vec![(1, 3), (2, 1), (1, 5)]);
        assert_eq!(row.glyph_at(3), [HAN]);
        assert_eq!(row.glyph_at(4), [HAN]);
        assert_eq!(row.dbcs_attr_at(3), DbcsAttr::Leading);
        assert_eq!(row.dbcs_attr_at(4), DbcsAttr::Trailing);
        assert_eq!(row.measure_right(), 5);
    }

    #[test]
    fn left_damage_repairs_leading_half() {
        let mut row = row10();
        row.write_glyph_at_measured(3, 2, &[HAN]).unwrap();
        // Stomp the trailing half; the orphaned leading half becomes a space.
        row.write_glyph_at_measured(4, 1, &[u16::from(b'x')]).unwrap();

        assert_eq!(row.text(), utf16("    x     ").as_slice());
        assert_eq!(cwid_runs(&row), vec![(1, 10)]);
        assert_eq!(row.glyph_at(3), utf16(" ").as_slice());
        assert_eq!(row.glyph_at(4), utf16("x").as_slice());
    }

    #[test]
    fn left_damage_with_space_never_leaves_half_glyph() {
        let mut row = row10();
        row.write_glyph_at_measured(3, 2, &[HAN]).unwrap();
        row.write_glyph_at_measured(4, 1, &[SPACE]).unwrap();
        assert_eq!(row.glyph_at(3), utf16(" ").as_slice());
        assert_eq!(row.glyph_at(4), utf16(" ").as_slice());
        assert_eq!(cwid_runs(&row), vec![(1, 10)]);
    }

    #[test]
    fn right_damage_repairs_trailing_half() {
        let mut row = row10();
        // Existing wide glyph at columns 3-4.
        row.write_glyph_at_measured(3, 2, &[HAN]).unwrap();
        // New wide glyph at columns 2-3 overlaps its leading half.
        row.write_glyph_at_measured(2, 2, &[HAN]).unwrap();

        assert_eq!(cwid_runs(&row), vec![(1, 2), (2, 1), (1, 6)]);
        assert_eq!(row.glyph_at(2), [HAN]);
        assert_eq!(row.glyph_at(3), [HAN]);
        // The orphaned trailing half at column 4 is now a space.
        assert_eq!(row.glyph_at(4), utf16(" ").as_slice());
        assert_eq!(row.dbcs_attr_at(4), DbcsAttr::Single);
    }

    #[test]
    fn overlapping_wide_writes() {
        let mut row = row10();
        row.write_glyph_at_measured(2, 2, &[HAN]).unwrap();
        row.write_glyph_at_measured(3, 2, &[HAN]).unwrap();

        // The first glyph's leading half at column 2 became a space.
        assert_eq!(cwid_runs(&row), vec![(1, 3), (2, 1), (1, 5)]);
        assert_eq!(row.glyph_at(2), utf16(" ").as_slice());
        assert_eq!(row.glyph_at(3), [HAN]);
        assert_eq!(row.glyph_at(4), [HAN]);
    }

    #[test]
    fn combining_marks_travel_with_their_base() {
        let mut row = row10();
        let glyph = utf16("e\u{0301}\u{0300}");
        assert_eq!(glyph.len(), 3);
        row.write_glyph_at_measured(2, 1, &glyph).unwrap();

        assert_eq!(cwid_runs(&row), vec![(1, 3), (0, 2), (1, 7)]);
        assert_eq!(row.glyph_at(2), glyph.as_slice());
        assert_eq!(row.dbcs_attr_at(2), DbcsAttr::Single);
    }

    #[test]
    fn combining_mark_at_column_zero() {
        let mut row = row10();
        let glyph = utf16("e\u{0301}");
        row.write_glyph_at_measured(0, 1, &glyph).unwrap();

        assert_eq!(cwid_runs(&row), vec![(1, 1), (0, 1), (1, 9)]);
        assert_eq!(row.glyph_at(0), glyph.as_slice());
        assert_eq!(row.dbcs_attr_at(0), DbcsAttr::Single);
        // Column 1 resolves to the next column, not the trailer.
        assert_eq!(row.glyph_at(1), utf16(" ").as_slice());
        assert_eq!(row.dbcs_attr_at(1), DbcsAttr::Single);
    }

    #[test]
    fn overwriting_a_cluster_removes_its_trailers() {
        let mut row = row10();
        row.write_glyph_at_measured(2, 1, &utf16("e\u{0301}")).unwrap();
        row.write_glyph_at_measured(2, 1, &utf16("x")).unwrap();

        assert_eq!(row.text(), utf16("  x       ").as_slice());
        assert_eq!(cwid_runs(&row), vec![(1, 10)]);
    }

    #[test]
    fn watermark_tracks_damage_not_just_the_glyph() {
        let mut row = row10();
        row.write_glyph_at_measured(2, 2, &[HAN]).unwrap();
        assert_eq!(row.measure_right(), 4);
        // A single-column write into the leading half damages through the
        // glyph's old right edge, and the watermark follows the repair.
        row.write_glyph_at_measured(2, 1, &[u16::from(b'x')]).unwrap();
        assert_eq!(row.measure_right(), 4);
    }

    #[test]
    fn zero_width_glyph_is_rejected() {
        let mut row = row10();
        assert!(row.write_glyph_at_measured(0, 0, &[u16::from(b'x')]).is_err());
        assert!(row.write_glyph_at_measured(0, 1, &[]).is_err());
        // The row is untouched.
        assert_eq!(row.text(), utf16("          ").as_slice());
    }

    #[test]
    fn write_past_the_end_is_rejected_and_leaves_row_unchanged() {
        let mut row = row10();
        row.write_glyph_at_measured(4, 1, &utf16("x")).unwrap();
        let before = row.clone();
        assert!(row.write_glyph_at_measured(9, 2, &[HAN]).is_err());
        assert_eq!(row, before);
    }

    #[test]
    fn clear_column_is_idempotent() {
        let mut row = row10();
        row.write_glyph_at_measured(3, 2, &[HAN]).unwrap();
        row.clear_column(3).unwrap();
        let once = row.clone();
        row.clear_column(3).unwrap();
        assert_eq!(row, once);
        assert_eq!(row.glyph_at(3), utf16(" ").as_slice());
        assert_eq!(row.glyph_at(4), utf16(" ").as_slice());
    }

    #[test]
    fn clear_column_out_of_range() {
        let mut row = row10();
        assert!(row.clear_column(10).is_err());
    }

    #[test]
    fn reset_returns_whether_state_changed() {
        let mut row = row10();
        let fill = TextAttribute::default();
        assert!(!row.reset(fill));

        row.write_glyph_at_measured(0, 1, &utf16("x")).unwrap();
        row.set_wrap_forced(true);
        assert!(row.reset(fill));

        let fresh = row10();
        assert_eq!(row, fresh);
        assert_eq!(row.measure_right(), 0);
        assert!(!row.was_wrap_forced());
        assert!(!row.reset(fill));
    }

    #[test]
    fn reset_with_a_different_fill_reports_change() {
        let mut row = row10();
        let red = TextAttribute::new(
            crate::buffer::attr::Color::Indexed(1),
            crate::buffer::attr::Color::Default,
            crate::buffer::attr::AttrFlags::empty(),
        );
        assert!(row.reset(red));
        assert_eq!(row.attr_row().at(0), Some(red));
        assert!(!row.reset(red));
    }

    #[test]
    fn resize_grow_appends_spaces() {
        let mut row = row10();
        row.write_glyph_at_measured(3, 2, &[HAN]).unwrap();
        row.resize(14).unwrap();
        assert_eq!(row.width(), 14);
        assert_eq!(row.text().len(), 13);
        assert_eq!(cwid_runs(&row), vec![(1, 3), (2, 1), (1, 9)]);
        assert_eq!(row.glyph_at(3), [HAN]);
        assert_eq!(row.attr_row().size(), 14);
    }

    #[test]
    fn resize_shrink_truncates_and_clamps_watermark() {
        let mut row = row10();
        let it = cells("0123456789", TextAttribute::default()).peekable();
        row.write_cells(it, 0, None, None).unwrap();
        assert_eq!(row.measure_right(), 10);

        row.resize(6).unwrap();
        assert_eq!(row.width(), 6);
        assert_eq!(row.text(), utf16("012345").as_slice());
        assert_eq!(cwid_runs(&row), vec![(1, 6)]);
        assert_eq!(row.measure_right(), 6);
        assert_eq!(row.attr_row().size(), 6);
    }

    #[test]
    fn resize_shrink_through_a_wide_glyph_drops_it() {
        let mut row = row10();
        row.write_glyph_at_measured(3, 2, &[HAN]).unwrap();
        // The new edge cuts the glyph at columns 3-4 in half.
        row.resize(4).unwrap();
        assert_eq!(row.width(), 4);
        assert_eq!(row.text(), utf16("    ").as_slice());
        assert_eq!(cwid_runs(&row), vec![(1, 4)]);
    }

    #[test]
    fn resize_to_zero_is_rejected() {
        let mut row = row10();
        assert!(row.resize(0).is_err());
        assert_eq!(row.width(), 10);
    }

    #[test]
    fn delimiter_classes() {
        let mut row = row10();
        let it = cells("a/ b", TextAttribute::default()).peekable();
        row.write_cells(it, 0, None, None).unwrap();
        let delimiters = utf16("/");

        assert_eq!(row.delimiter_class_at(0, &delimiters).unwrap(), DelimiterClass::RegularChar);
        assert_eq!(row.delimiter_class_at(1, &delimiters).unwrap(), DelimiterClass::DelimiterChar);
        assert_eq!(row.delimiter_class_at(2, &delimiters).unwrap(), DelimiterClass::ControlChar);
        assert_eq!(row.delimiter_class_at(3, &delimiters).unwrap(), DelimiterClass::RegularChar);
        // Untouched tail columns are spaces.
        assert_eq!(row.delimiter_class_at(9, &delimiters).unwrap(), DelimiterClass::ControlChar);
    }

    #[test]
    fn delimiter_class_at_width_is_invalid() {
        let row = row10();
        assert_eq!(
            row.delimiter_class_at(10, &[]),
            Err(RowError::InvalidArgument("column out of range"))
        );
    }

    #[test]
    fn write_cells_stops_at_the_limit() {
        let mut row = row10();
        let it = cells("0123456789ab", TextAttribute::default()).peekable();
        let mut rest = row.write_cells(it, 0, Some(true), Some(10)).unwrap();

        assert_eq!(row.text(), utf16("0123456789").as_slice());
        assert!(row.was_wrap_forced());
        assert_eq!(row.measure_right(), 10);
        // The two unconsumed cells come back to the caller.
        assert_eq!(rest.next().map(|c| c.glyph().to_vec()), Some(utf16("a")));
        assert_eq!(rest.next().map(|c| c.glyph().to_vec()), Some(utf16("b")));
        assert!(rest.next().is_none());
    }

    #[test]
    fn write_cells_wide_glyph_exactly_fits() {
        let mut row = row10();
        let it = cells("01234567\u{6F22}", TextAttribute::default()).peekable();
        let mut rest = row.write_cells(it, 0, None, None).unwrap();

        assert!(rest.next().is_none());
        assert_eq!(row.glyph_at(8), [HAN]);
        assert_eq!(row.glyph_at(9), [HAN]);
        assert!(!row.was_double_byte_padded());
    }

    #[test]
    fn write_cells_sets_double_byte_padded() {
        let mut row = row10();
        let it = cells("012345678\u{6F22}", TextAttribute::default()).peekable();
        let mut rest = row.write_cells(it, 0, None, None).unwrap();

        // Only column 9 is left; the wide glyph cannot fit and the last
        // column becomes a space instead.
        assert_eq!(row.text(), utf16("012345678 ").as_slice());
        assert!(row.was_double_byte_padded());
        assert_eq!(row.measure_right(), 10);
        // The unconsumed wide cell comes back for the next row.
        assert_eq!(rest.next().map(|c| c.glyph().to_vec()), Some(vec![HAN]));
    }

    #[test]
    fn write_cells_with_clip_limit_does_not_mark_padding() {
        let mut row = row10();
        let it = cells("0123\u{6F22}", TextAttribute::default()).peekable();
        let mut rest = row.write_cells(it, 0, None, Some(5)).unwrap();

        assert!(!row.was_double_byte_padded());
        assert_eq!(row.glyph_at(4), utf16(" ").as_slice());
        assert_eq!(rest.next().map(|c| c.glyph().to_vec()), Some(vec![HAN]));
    }

    #[test]
    fn write_cells_paints_attributes_per_column() {
        let mut row = row10();
        let red = TextAttribute::new(
            crate::buffer::attr::Color::Indexed(1),
            crate::buffer::attr::Color::Default,
            crate::buffer::attr::AttrFlags::BOLD,
        );
        let it = cells("ab\u{6F22}", red).peekable();
        row.write_cells(it, 1, None, None).unwrap();

        assert_eq!(row.attr_row().at(0), Some(TextAttribute::default()));
        for col in 1..5 {
            assert_eq!(row.attr_row().at(col), Some(red));
        }
        assert_eq!(row.attr_row().at(5), Some(TextAttribute::default()));
    }

    #[test]
    fn write_cells_bad_index() {
        let mut row = row10();
        let it = cells("x", TextAttribute::default()).peekable();
        assert!(row.write_cells(it, 10, None, None).is_err());
    }

    #[test]
    fn equality_ignores_rendition_and_watermark() {
        let mut a = row10();
        let mut b = row10();
        a.set_line_rendition(LineRendition::DoubleWidthSingleHeight);
        a.write_glyph_at_measured(0, 1, &utf16("x")).unwrap();
        a.clear_column(0).unwrap();
        // b never wrote, so its watermark differs; content is equal.
        assert_eq!(a, b);

        b.set_wrap_forced(true);
        assert_ne!(a, b);
    }

    #[test]
    fn glyph_at_past_the_end_is_the_empty_tail() {
        let row = row10();
        assert_eq!(row.glyph_at(10), &[] as &[u16]);
        assert_eq!(row.glyph_at(200), &[] as &[u16]);
    }
}

#[cfg(kani)]
mod proofs {
    /// The column to code-unit arithmetic never indexes past a run.
    #[kani::proof]
    fn lookup_offset_stays_inside_run() {
        let value: u8 = kani::any();
        let length: u16 = kani::any();
        let cols_left: usize = kani::any();

        kani::assume(value >= 1);
        kani::assume(length >= 1);
        let covered = usize::from(value) * usize::from(length);
        kani::assume(cols_left < covered);

        let cu_into_run = cols_left / usize::from(value);
        kani::assert(cu_into_run < usize::from(length), "code unit lands inside the run");
        kani::assert(
            cols_left % usize::from(value) < usize::from(value),
            "offset within glyph is bounded by the glyph width",
        );
    }

    /// Damage replacement preserves the column count it removes.
    #[kani::proof]
    fn damage_extent_balances() {
        let col: u16 = kani::any();
        let ncols: u16 = kani::any();
        let off: u16 = kani::any();
        let covered: u16 = kani::any();

        kani::assume(ncols >= 1 && ncols <= 255);
        kani::assume(covered >= 1 && covered <= 255);
        kani::assume(off < covered);
        kani::assume(col >= off);
        kani::assume(u32::from(col) + u32::from(ncols) < 65_000);

        let col = usize::from(col);
        let ncols = usize::from(ncols);
        let min_damage = col - usize::from(off);
        let max_damage = min_damage + usize::from(covered);
        if max_damage >= col + ncols {
            let left = col - min_damage;
            let right = max_damage - (col + ncols);
            kani::assert(
                left + ncols + right == max_damage - min_damage,
                "pads plus glyph cover exactly the damaged columns",
            );
        }
    }
}
