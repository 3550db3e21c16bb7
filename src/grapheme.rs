//! Grapheme cluster measurement for building measured cells.
//!
//! The row engine itself never measures text: it is handed glyphs with a
//! known column width. This module is the measuring side of that contract,
//! turning caller strings into `(cluster, width)` pairs:
//!
//! - `unicode-segmentation` finds grapheme boundaries (UAX #29), so a base
//!   character plus its combining marks arrives as one cluster.
//! - `unicode-width` supplies the terminal display width, clamped to 2 since
//!   a glyph never spans more than two cells.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// A grapheme cluster paired with its terminal display width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster<'a> {
    /// The cluster's string slice.
    pub text: &'a str,
    /// Display width in cells (0, 1, or 2).
    pub width: usize,
}

impl Cluster<'_> {
    /// Number of UTF-16 code units the cluster encodes to.
    #[must_use]
    pub fn utf16_len(&self) -> usize {
        self.text.encode_utf16().count()
    }
}

/// Display width of a single grapheme cluster, clamped to 2.
#[must_use]
pub fn display_width(cluster: &str) -> usize {
    UnicodeWidthStr::width(cluster).min(2)
}

/// Split `s` into measured grapheme clusters.
pub fn clusters(s: &str) -> impl Iterator<Item = Cluster<'_>> {
    s.graphemes(true).map(|g| Cluster {
        text: g,
        width: display_width(g),
    })
}
