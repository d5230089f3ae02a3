//! Fixed-width text tables.
//!
//! Cells may contain ANSI styling (dimmed or colored text); column widths are computed from the
//! visible width of the cells so styled and plain cells line up.
use std::{fmt::Display, iter};

use console::measure_text_width;

/// A header row plus data rows, printed using the [`Display`] trait.
///
/// Every column is as wide as its widest cell plus [`CELL_PADDING`] spaces.
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Padding added after every cell.
const CELL_PADDING: usize = 4;

impl Table {
    pub fn new(header: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { header, rows }
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.header.len()];
        for row in iter::once(&self.header).chain(self.rows.iter()) {
            for (index, cell) in row.iter().enumerate() {
                let width = measure_text_width(cell) + CELL_PADDING;
                match widths.get_mut(index) {
                    Some(current) => *current = (*current).max(width),
                    None => widths.push(width),
                }
            }
        }
        widths
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let widths = self.column_widths();

        for row in iter::once(&self.header).chain(self.rows.iter()) {
            for (cell, width) in row.iter().zip(widths.iter()) {
                // pad manually, format width specifiers would count escape codes
                let padding = width.saturating_sub(measure_text_width(cell));
                write!(f, "{cell}{:padding$}", "")?;
            }

            writeln!(f)?;
        }

        Ok(())
    }
}
