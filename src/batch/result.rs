//! Result type for batch runs

use crate::results::{CompletedLookup, ResultRow, RowShape, RunSummary};

/// Result of a batch run
///
/// `completed` and `rows` hold exactly one entry per input line, in input
/// order, whatever order the lookups finished in.
///
/// # Examples
///
/// ```no_run
/// use asn_finder::{run_batch, BatchConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ips = vec!["8.8.8.8".to_string(), "1.1.1.1".to_string()];
/// let result = run_batch(&ips, BatchConfig::default()).await?;
///
/// for row in &result.rows {
///     println!("{} -> {}", row.ip, row.asn);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// Every input line with its outcome
    pub completed: Vec<CompletedLookup>,
    /// Export rows built from `completed`
    pub rows: Vec<ResultRow>,
    /// Counters for the run
    pub summary: RunSummary,
    /// Columns every row carries
    pub shape: RowShape,
}

impl BatchResult {
    /// Build rows for `completed` in the given shape
    pub fn new(completed: Vec<CompletedLookup>, summary: RunSummary, shape: RowShape) -> Self {
        let rows = completed
            .iter()
            .map(|lookup| ResultRow::from_completed(lookup, shape))
            .collect();
        Self {
            completed,
            rows,
            summary,
            shape,
        }
    }

    /// Number of input lines processed
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the run had no input lines
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows of successful lookups
    pub fn successful_rows(&self) -> impl Iterator<Item = &ResultRow> {
        self.rows.iter().filter(|row| row.is_success())
    }
}
