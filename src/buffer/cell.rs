//! Measured cells for streaming writes into a row.
//!
//! A cell is one glyph (one or more UTF-16 code units), the number of
//! columns it occupies, and the attribute it paints. [`Row::write_cells`]
//! consumes a peekable stream of these and stops mid-sequence when the next
//! cell no longer fits, handing the iterator back to the caller.
//!
//! [`Row::write_cells`]: crate::buffer::row::Row::write_cells

use smallvec::SmallVec;

use crate::buffer::attr::TextAttribute;
use crate::grapheme::{self, Cluster};

/// One glyph plus the columns it occupies and the attribute it paints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    glyph: SmallVec<[u16; 2]>,
    columns: u16,
    attr: TextAttribute,
}

impl Cell {
    /// Create a cell from raw UTF-16 code units and a measured width.
    #[must_use]
    pub fn new(glyph: &[u16], columns: u16, attr: TextAttribute) -> Self {
        Self {
            glyph: SmallVec::from_slice(glyph),
            columns,
            attr,
        }
    }

    /// Create a single-column space cell.
    #[must_use]
    pub fn space(attr: TextAttribute) -> Self {
        Self::new(&[0x20], 1, attr)
    }

    /// Create a cell from a single character, measuring its width.
    ///
    /// Zero-width characters are given one column; a lone combining mark has
    /// no base to attach to and must occupy a cell of its own.
    #[must_use]
    pub fn from_char(ch: char, attr: TextAttribute) -> Self {
        let mut buf = [0u16; 2];
        let encoded = ch.encode_utf16(&mut buf);
        let columns = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
        Self::new(encoded, columns as u16, attr)
    }

    fn from_cluster(cluster: Cluster<'_>, attr: TextAttribute) -> Self {
        Self {
            glyph: cluster.text.encode_utf16().collect(),
            columns: cluster.width.max(1) as u16,
            attr,
        }
    }

    /// The glyph's UTF-16 code units.
    #[must_use]
    #[inline]
    pub fn glyph(&self) -> &[u16] {
        &self.glyph
    }

    /// Columns the glyph occupies.
    #[must_use]
    #[inline]
    pub fn columns(&self) -> u16 {
        self.columns
    }

    /// The attribute painted across the cell's columns.
    #[must_use]
    #[inline]
    pub fn attr(&self) -> TextAttribute {
        self.attr
    }
}

/// Split `text` into measured cells, one per grapheme cluster, all painted
/// with `attr`.
pub fn cells(text: &str, attr: TextAttribute) -> impl Iterator<Item = Cell> + '_ {
    grapheme::clusters(text).map(move |cluster| Cell::from_cluster(cluster, attr))
}
