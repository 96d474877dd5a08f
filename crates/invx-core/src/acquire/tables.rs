//! Table detection over extracted page text.
//!
//! Two backends are chained: ruled tables (cells delimited by `|`, `¦` or
//! tabs) are tried first, whitespace-aligned tables second.

use tracing::{debug, trace};

use crate::error::PdfError;
use crate::models::config::TableConfig;

/// Rows of cells as read off the page, header row included.
pub type Grid = Vec<Vec<String>>;

/// A table found on a page (1-indexed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableGrid {
    pub page: u32,
    pub cells: Grid,
}

impl TableGrid {
    /// Every cell is blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().flatten().all(|c| c.trim().is_empty())
    }
}

/// Finds tables in the text of a single page.
pub trait TableBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Tables on the page, top to bottom.
    fn detect(&self, page_text: &str) -> Result<Vec<Grid>, PdfError>;
}

/// Groups consecutive qualifying lines into tables.
fn group_rows<F>(page_text: &str, min_rows: usize, min_columns: usize, mut split: F) -> Vec<Grid>
where
    F: FnMut(&str) -> Option<Vec<String>>,
{
    let mut tables = Vec::new();
    let mut current: Grid = Vec::new();

    let flush = |current: &mut Grid, tables: &mut Vec<Grid>| {
        let widest = current.iter().map(Vec::len).max().unwrap_or(0);
        if current.len() >= min_rows && widest >= min_columns {
            tables.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for line in page_text.lines() {
        match split(line) {
            Some(cells) => current.push(cells),
            None => flush(&mut current, &mut tables),
        }
    }
    flush(&mut current, &mut tables);

    tables
}

/// Tables drawn with explicit cell separators.
#[derive(Debug, Clone)]
pub struct RuledTableBackend {
    min_rows: usize,
    min_columns: usize,
}

impl RuledTableBackend {
    const SEPARATORS: [char; 3] = ['|', '¦', '\t'];

    pub fn new(config: &TableConfig) -> Self {
        Self {
            min_rows: config.min_rows,
            min_columns: config.min_columns,
        }
    }

    fn split_line(line: &str) -> Option<Vec<String>> {
        if !line.contains(Self::SEPARATORS) {
            return None;
        }

        let trimmed = line.trim();
        let mut cells: Vec<String> = trimmed
            .split(Self::SEPARATORS)
            .map(|c| c.trim().to_string())
            .collect();

        // Border separators leave empty edge cells.
        if trimmed.starts_with(['|', '¦']) {
            cells.remove(0);
        }
        if trimmed.ends_with(['|', '¦']) && !cells.is_empty() {
            cells.pop();
        }

        Some(cells)
    }
}

impl TableBackend for RuledTableBackend {
    fn name(&self) -> &'static str {
        "ruled"
    }

    fn detect(&self, page_text: &str) -> Result<Vec<Grid>, PdfError> {
        // Horizontal rules (`+----+----+`, `|----|`) sit between rows of the
        // same table; drop them so only plain text lines end a table.
        let rows: Vec<&str> = page_text
            .lines()
            .filter(|line| {
                let trimmed = line.trim();
                trimmed.is_empty()
                    || !trimmed.chars().all(|c| matches!(c, '-' | '=' | '+' | '|' | '¦' | ' ' | '\t'))
            })
            .collect();

        Ok(group_rows(&rows.join("\n"), self.min_rows, self.min_columns, Self::split_line))
    }
}

/// Tables whose columns are aligned with runs of spaces.
#[derive(Debug, Clone)]
pub struct StreamTableBackend {
    min_rows: usize,
    min_columns: usize,
    gap: String,
}

impl StreamTableBackend {
    pub fn new(config: &TableConfig) -> Self {
        Self {
            min_rows: config.min_rows,
            min_columns: config.min_columns,
            gap: " ".repeat(config.column_gap.max(1)),
        }
    }

    fn split_line(&self, line: &str) -> Option<Vec<String>> {
        let cells: Vec<String> = line
            .trim()
            .replace('\t', &self.gap)
            .split(self.gap.as_str())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();

        (cells.len() >= self.min_columns).then_some(cells)
    }
}

impl TableBackend for StreamTableBackend {
    fn name(&self) -> &'static str {
        "stream"
    }

    fn detect(&self, page_text: &str) -> Result<Vec<Grid>, PdfError> {
        Ok(group_rows(page_text, self.min_rows, self.min_columns, |line| {
            self.split_line(line)
        }))
    }
}

/// Primary backend with a secondary fallback.
pub struct TableChain {
    primary: Box<dyn TableBackend>,
    secondary: Box<dyn TableBackend>,
}

impl TableChain {
    pub fn new(primary: Box<dyn TableBackend>, secondary: Box<dyn TableBackend>) -> Self {
        Self { primary, secondary }
    }

    /// Ruled detection first, whitespace-aligned detection second.
    pub fn from_config(config: &TableConfig) -> Self {
        Self::new(
            Box::new(RuledTableBackend::new(config)),
            Box::new(StreamTableBackend::new(config)),
        )
    }

    fn run(backend: &dyn TableBackend, pages: &[String]) -> Result<Vec<TableGrid>, PdfError> {
        let mut found = Vec::new();
        for (index, text) in pages.iter().enumerate() {
            for cells in backend.detect(text)? {
                found.push(TableGrid {
                    page: index as u32 + 1,
                    cells,
                });
            }
        }
        Ok(found)
    }

    /// Tables across all pages in page order. The secondary backend runs when
    /// the primary finds nothing, fails, or returns an all-blank table.
    pub fn detect(&self, pages: &[String]) -> Vec<TableGrid> {
        match Self::run(self.primary.as_ref(), pages) {
            Ok(tables) if !tables.is_empty() && !tables.iter().any(TableGrid::is_blank) => {
                debug!("{} backend found {} tables", self.primary.name(), tables.len());
                return tables;
            }
            Ok(tables) => trace!(
                "{} backend produced {} usable tables, falling back",
                self.primary.name(),
                tables.iter().filter(|t| !t.is_blank()).count()
            ),
            Err(e) => debug!("{} backend failed: {}", self.primary.name(), e),
        }

        match Self::run(self.secondary.as_ref(), pages) {
            Ok(tables) => {
                debug!("{} backend found {} tables", self.secondary.name(), tables.len());
                tables
            }
            Err(e) => {
                debug!("{} backend failed: {}", self.secondary.name(), e);
                Vec::new()
            }
        }
    }
}

impl Default for TableChain {
    fn default() -> Self {
        Self::from_config(&TableConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    struct Fixed(&'static str, Result<Vec<Grid>, ()>);

    impl TableBackend for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }

        fn detect(&self, _page_text: &str) -> Result<Vec<Grid>, PdfError> {
            self.1.clone().map_err(|_| PdfError::TableDetection {
                backend: self.0,
                reason: "broken".to_string(),
            })
        }
    }

    #[test]
    fn test_ruled_table_with_borders() {
        let text = "Invoice 42\n\
                    +------+-----+--------+\n\
                    | Item | Qty | Amount |\n\
                    +------+-----+--------+\n\
                    | Pen  | 2   | 20.00  |\n\
                    | Ink  | 1   | 9.50   |\n\
                    +------+-----+--------+\n\
                    Thank you";

        let tables = RuledTableBackend::new(&TableConfig::default()).detect(text).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0],
            vec![row(&["Item", "Qty", "Amount"]), row(&["Pen", "2", "20.00"]), row(&["Ink", "1", "9.50"])]
        );
    }

    #[test]
    fn test_ruled_table_tabs() {
        let text = "Item\tQty\nPen\t2\n\nnot a table";
        let tables = RuledTableBackend::new(&TableConfig::default()).detect(text).unwrap();
        assert_eq!(tables, vec![vec![row(&["Item", "Qty"]), row(&["Pen", "2"])]]);
    }

    #[test]
    fn test_ruled_ignores_single_row() {
        let text = "a | b\nplain text";
        let tables = RuledTableBackend::new(&TableConfig::default()).detect(text).unwrap();
        assert!(tables.is_empty());
    }

    #[test]
    fn test_stream_table() {
        let text = "TAX INVOICE\n\
                    Description      Qty   Rate    Amount\n\
                    Blue Pen         2     10.00   20.00\n\
                    Ink Bottle       1     9.50    9.50\n\
                    Total: 29.50";

        let tables = StreamTableBackend::new(&TableConfig::default()).detect(text).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0][0], row(&["Description", "Qty", "Rate", "Amount"]));
        assert_eq!(tables[0][1], row(&["Blue Pen", "2", "10.00", "20.00"]));
        assert_eq!(tables[0].len(), 3);
    }

    #[test]
    fn test_chain_prefers_primary() {
        let chain = TableChain::new(
            Box::new(Fixed("primary", Ok(vec![vec![row(&["a", "b"])]]))),
            Box::new(Fixed("secondary", Ok(vec![vec![row(&["x", "y"])]]))),
        );

        let tables = chain.detect(&["page".to_string()]);
        assert_eq!(tables, vec![TableGrid { page: 1, cells: vec![row(&["a", "b"])] }]);
    }

    #[test]
    fn test_chain_falls_back_on_empty_blank_or_error() {
        let primaries: Vec<Box<dyn TableBackend>> = vec![
            Box::new(Fixed("none", Ok(vec![]))),
            Box::new(Fixed("blank", Ok(vec![vec![row(&["", " "])]]))),
            Box::new(Fixed("error", Err(()))),
        ];

        for primary in primaries {
            let chain = TableChain::new(
                primary,
                Box::new(Fixed("secondary", Ok(vec![vec![row(&["x", "y"])]]))),
            );
            let tables = chain.detect(&["p1".to_string(), "p2".to_string()]);
            assert_eq!(tables.len(), 2);
            assert_eq!(tables[1].page, 2);
            assert_eq!(tables[0].cells, vec![row(&["x", "y"])]);
        }
    }

    #[test]
    fn test_chain_both_exhausted() {
        let chain = TableChain::new(
            Box::new(Fixed("none", Ok(vec![]))),
            Box::new(Fixed("broken", Err(()))),
        );
        assert!(chain.detect(&["text".to_string()]).is_empty());
    }
}
