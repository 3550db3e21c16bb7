//! Render attributes and the column-indexed attribute row.
//!
//! Attribute runs and glyph-width runs follow very different entropy
//! patterns (a rainbow prompt over plain ASCII, or plain colors over mixed
//! CJK), so the attribute row compresses independently of the text row and
//! is only kept width-aligned with it.

use bitflags::bitflags;

use crate::error::RowError;
use crate::rle::{Rle, Run};

/// Color for a render attribute.
///
/// Follows the terminal color model hierarchy: default → 256 indexed →
/// 24-bit RGB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Color {
    /// Terminal default foreground/background.
    #[default]
    Default,
    /// 256-color palette index.
    Indexed(u8),
    /// 24-bit true color.
    Rgb(u8, u8, u8),
}

bitflags! {
    /// SGR-style text attribute flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AttrFlags: u16 {
        const BOLD          = 1 << 0;
        const DIM           = 1 << 1;
        const ITALIC        = 1 << 2;
        const UNDERLINE     = 1 << 3;
        const BLINK         = 1 << 4;
        const INVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

/// Render attribute for one column.
///
/// The row engine treats this as an opaque token: it forwards, stores, and
/// compares attributes but never inspects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TextAttribute {
    /// Foreground color.
    pub fg: Color,
    /// Background color.
    pub bg: Color,
    /// Attribute flags.
    pub flags: AttrFlags,
}

impl TextAttribute {
    /// Create an attribute from its parts.
    #[must_use]
    pub const fn new(fg: Color, bg: Color, flags: AttrFlags) -> Self {
        Self { fg, bg, flags }
    }
}

/// Width-aligned run-length store of render attributes, indexed by column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttrRow {
    attrs: Rle<TextAttribute>,
}

impl AttrRow {
    /// Create an attribute row of `width` columns filled with `fill`.
    #[must_use]
    pub fn new(width: u16, fill: TextAttribute) -> Self {
        Self {
            attrs: Rle::from_run(fill, width),
        }
    }

    /// Number of columns covered.
    #[must_use]
    #[inline]
    pub fn size(&self) -> usize {
        self.attrs.size()
    }

    /// Attribute at `col`, or `None` when out of range.
    #[must_use]
    pub fn at(&self, col: u16) -> Option<TextAttribute> {
        self.attrs.get(usize::from(col))
    }

    /// The attribute runs, in column order.
    #[must_use]
    #[inline]
    pub fn runs(&self) -> &[Run<TextAttribute>] {
        self.attrs.runs()
    }

    /// Set columns `[begin, end)` to `attr`.
    pub fn replace(&mut self, begin: u16, end: u16, attr: TextAttribute) -> Result<(), RowError> {
        if begin > end {
            return Err(RowError::InvalidArgument("replace range out of bounds"));
        }
        self.attrs.replace(
            usize::from(begin),
            usize::from(end),
            &[Run::new(attr, end - begin)],
        )
    }

    /// Grow or shrink to `new_width` columns.
    ///
    /// Growth reuses the final run's attribute, matching how the row extends
    /// with its current trailing fill.
    pub fn resize(&mut self, new_width: u16) -> Result<(), RowError> {
        self.attrs.resize_trailing_extent(usize::from(new_width))
    }

    /// Reinitialize to `width` columns of `fill`.
    pub fn reset(&mut self, width: u16, fill: TextAttribute) {
        self.attrs = Rle::from_run(fill, width);
    }
}
