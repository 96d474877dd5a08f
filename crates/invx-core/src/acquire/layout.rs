//! Table detection from positioned text runs.
//!
//! Runs sharing a baseline form a line; runs on a line separated by more
//! than the column gap are distinct cells. Consecutive multi-cell lines form
//! a table whose columns are anchored on its widest row.

use tracing::trace;

use super::tables::Grid;
use crate::models::config::TableConfig;
use crate::pdf::TextRun;

/// A cell on a line: its horizontal extent and text.
#[derive(Debug, Clone, PartialEq)]
struct Cell {
    x: f32,
    end: f32,
    text: String,
}

/// Geometry-based table finder over one page's text runs.
#[derive(Debug, Clone)]
pub struct LayoutTableFinder {
    min_rows: usize,
    min_columns: usize,
    /// Column gap in average glyph widths.
    column_gap: f32,
}

impl LayoutTableFinder {
    /// Average glyph width as a fraction of the font size.
    const GLYPH_WIDTH: f32 = 0.5;

    pub fn new(config: &TableConfig) -> Self {
        Self {
            min_rows: config.min_rows.max(1),
            min_columns: config.min_columns.max(1),
            column_gap: config.column_gap.max(1) as f32,
        }
    }

    /// Tables on the page, top to bottom.
    pub fn detect(&self, runs: &[TextRun]) -> Vec<Grid> {
        let lines = self.cell_lines(runs);

        let mut tables = Vec::new();
        let mut current: Vec<Vec<Cell>> = Vec::new();
        for line in lines {
            if line.len() >= self.min_columns {
                current.push(line);
            } else {
                self.flush(&mut current, &mut tables);
            }
        }
        self.flush(&mut current, &mut tables);

        trace!("layout finder produced {} tables", tables.len());
        tables
    }

    fn flush(&self, current: &mut Vec<Vec<Cell>>, tables: &mut Vec<Grid>) {
        if current.len() >= self.min_rows {
            tables.push(align(current));
        }
        current.clear();
    }

    /// Runs grouped by baseline, top to bottom, each line merged into cells.
    fn cell_lines(&self, runs: &[TextRun]) -> Vec<Vec<Cell>> {
        let mut sorted: Vec<&TextRun> = runs.iter().filter(|r| !r.text.trim().is_empty()).collect();
        sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut lines: Vec<Vec<&TextRun>> = Vec::new();
        for run in sorted {
            let tolerance = (run.size * 0.5).max(1.0);
            match lines.last_mut() {
                Some(line) if (line[0].y - run.y).abs() <= tolerance => line.push(run),
                _ => lines.push(vec![run]),
            }
        }

        lines
            .into_iter()
            .map(|mut line| {
                line.sort_by(|a, b| a.x.total_cmp(&b.x));
                self.merge_cells(&line)
            })
            .collect()
    }

    fn merge_cells(&self, line: &[&TextRun]) -> Vec<Cell> {
        let mut cells: Vec<Cell> = Vec::new();
        for run in line {
            let text = run.text.trim();
            let char_width = run.size * Self::GLYPH_WIDTH;
            match cells.last_mut() {
                Some(cell) if run.x - cell.end <= self.column_gap * char_width => {
                    if run.x - cell.end > 0.1 * run.size {
                        cell.text.push(' ');
                    }
                    cell.text.push_str(text);
                    cell.end = cell.end.max(run.end());
                }
                _ => cells.push(Cell {
                    x: run.x,
                    end: run.end(),
                    text: text.to_string(),
                }),
            }
        }
        cells
    }
}

/// Place every row's cells under the nearest column of the widest row.
fn align(rows: &[Vec<Cell>]) -> Grid {
    let anchors: Vec<f32> = rows
        .iter()
        .max_by_key(|row| row.len())
        .map(|row| row.iter().map(|c| c.x).collect())
        .unwrap_or_default();

    rows.iter()
        .map(|row| {
            let mut slots = vec![String::new(); anchors.len()];
            for cell in row {
                let column = nearest(&anchors, cell.x);
                let slot = &mut slots[column];
                if !slot.is_empty() {
                    slot.push(' ');
                }
                slot.push_str(&cell.text);
            }
            slots
        })
        .collect()
}

fn nearest(anchors: &[f32], x: f32) -> usize {
    anchors
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (*a - x).abs().total_cmp(&(*b - x).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(x: f32, y: f32, text: &str) -> TextRun {
        TextRun {
            x,
            y,
            width: text.chars().count() as f32 * 5.0,
            size: 10.0,
            text: text.to_string(),
        }
    }

    fn finder() -> LayoutTableFinder {
        LayoutTableFinder::new(&TableConfig::default())
    }

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_cells_placed_with_their_own_matrix() {
        let runs = vec![
            run(40.0, 700.0, "Description"),
            run(240.0, 700.0, "Qty"),
            run(440.0, 700.0, "Amount"),
            run(40.0, 686.0, "Pen"),
            run(240.0, 686.0, "2"),
            run(440.0, 686.0, "20.00"),
            run(40.0, 672.0, "Notebook"),
            run(240.0, 672.0, "1"),
            run(440.0, 672.0, "45.50"),
        ];

        let tables = finder().detect(&runs);
        assert_eq!(
            tables,
            vec![grid(&[
                &["Description", "Qty", "Amount"],
                &["Pen", "2", "20.00"],
                &["Notebook", "1", "45.50"],
            ])]
        );
    }

    #[test]
    fn test_drawing_order_does_not_matter() {
        let runs = vec![
            run(440.0, 686.0, "20.00"),
            run(40.0, 700.0, "Item"),
            run(40.0, 686.0, "Pen"),
            run(440.0, 700.0, "Amount"),
        ];

        let tables = finder().detect(&runs);
        assert_eq!(tables, vec![grid(&[&["Item", "Amount"], &["Pen", "20.00"]])]);
    }

    #[test]
    fn test_missing_cell_left_blank() {
        let runs = vec![
            run(40.0, 700.0, "Item"),
            run(240.0, 700.0, "Qty"),
            run(440.0, 700.0, "Amount"),
            run(40.0, 686.0, "Pen"),
            run(445.0, 686.0, "20.00"),
        ];

        let tables = finder().detect(&runs);
        assert_eq!(tables[0][1], vec!["Pen", "", "20.00"]);
    }

    #[test]
    fn test_close_runs_merge_into_one_cell() {
        // "Blue" ends at 60; "Pen" starts one glyph later.
        let runs = vec![
            run(40.0, 700.0, "Blue"),
            run(65.0, 700.0, "Pen"),
            run(240.0, 700.0, "2"),
            run(40.0, 686.0, "Ink"),
            run(240.0, 686.0, "1"),
        ];

        let tables = finder().detect(&runs);
        assert_eq!(tables[0][0], vec!["Blue Pen", "2"]);
    }

    #[test]
    fn test_single_cell_lines_split_tables() {
        let runs = vec![
            run(40.0, 700.0, "Invoice No: 42"),
            run(40.0, 686.0, "Item"),
            run(240.0, 686.0, "Qty"),
            run(40.0, 672.0, "Pen"),
            run(240.0, 672.0, "2"),
            run(40.0, 658.0, "Thank you"),
            run(40.0, 644.0, "Total"),
            run(240.0, 644.0, "20.00"),
        ];

        let tables = finder().detect(&runs);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0], grid(&[&["Item", "Qty"], &["Pen", "2"]]));
    }

    #[test]
    fn test_plain_lines_are_not_tables() {
        let runs = vec![
            run(40.0, 700.0, "Invoice Number: INV-1"),
            run(40.0, 686.0, "Total: 100.00"),
        ];
        assert!(finder().detect(&runs).is_empty());
        assert!(finder().detect(&[]).is_empty());
    }
}
