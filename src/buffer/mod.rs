//! Row storage for a terminal screen buffer.
//!
//! ## Design
//!
//! The buffer module holds one concern: a single row of the screen, with
//! column-addressed reads and damage-aware writes over mixed-width text.
//! Three coordinate systems meet here:
//!
//! - **Columns**: what the cursor addresses (`0..width`).
//! - **Code units**: the UTF-16 elements of the row's text.
//! - **Glyphs**: what the terminal renders; one or more code units
//!   covering one or more columns.
//!
//! [`Row`] owns the text and its column index; [`AttrRow`] is the parallel
//! per-column attribute store; [`Cell`] is the unit of streamed writes.

mod attr;
mod cell;
mod row;

pub use attr::{AttrFlags, AttrRow, Color, TextAttribute};
pub use cell::{cells, Cell};
pub use row::{BufferId, DbcsAttr, DelimiterClass, LineRendition, Row, RowFlags};
