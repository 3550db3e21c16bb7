//! Column-addressed row storage for a terminal screen buffer.
//!
//! ## Design
//!
//! A terminal "column" is not a character: it may be half of a double-width
//! CJK glyph, the tail of a grapheme cluster with combining marks, or a
//! padding cell left behind when a wide glyph was partially overwritten.
//! This crate implements the row engine that reconciles those views:
//!
//! - [`Row`]: text content plus a run-length column index, with
//!   column-addressed reads, damage-aware overwrite, DBCS and delimiter
//!   classification, and a right-edge watermark for renderers.
//! - [`Rle`]: the compact ordered run-length map backing both the column
//!   index and the attribute row.
//! - [`AttrRow`]: the width-aligned per-column render attribute store.
//! - [`Cell`] / [`cells`]: measured glyphs for streaming writes.
//!
//! The engine is single-threaded and non-suspending: every operation runs
//! to completion or fails synchronously, leaving the row unchanged.
//!
//! ## Example
//!
//! ```
//! use termrow::{cells, BufferId, Row, TextAttribute};
//!
//! let mut row = Row::new(10, TextAttribute::default(), BufferId::default())?;
//! let it = cells("hi \u{6F22}", TextAttribute::default()).peekable();
//! row.write_cells(it, 0, None, None)?;
//!
//! assert_eq!(row.glyph_at(3), "\u{6F22}".encode_utf16().collect::<Vec<_>>());
//! assert_eq!(row.glyph_at(4), row.glyph_at(3));
//! assert_eq!(row.measure_right(), 5);
//! # Ok::<(), termrow::RowError>(())
//! ```

pub mod buffer;
pub mod error;
pub mod grapheme;
pub mod rle;

pub use buffer::{
    cells, AttrFlags, AttrRow, BufferId, Cell, Color, DbcsAttr, DelimiterClass, LineRendition,
    Row, RowFlags, TextAttribute,
};
pub use error::RowError;
pub use rle::{Rle, Run};
