//! Uploaded expression-table parsing.
//!
//! The upload format is a plain comma-separated file: one header row of gene
//! identifiers, then one sample row of expression values (extra sample rows
//! are tolerated and ignored with a warning).

use super::InferenceError;

/// Parsed upload, before alignment. Cells are `Option<f64>`: a cell that
/// failed numeric coercion is missing, not zero, until the fill policy runs.
#[derive(Debug, Clone)]
pub struct ExpressionTable {
    columns: Vec<String>,
    rows: Vec<Vec<Option<f64>>>,
}

impl ExpressionTable {
    /// Parse raw CSV bytes into a table.
    ///
    /// Fails with `ParseFailure` when the bytes are not UTF-8, the header is
    /// empty, or no data row is present.
    pub fn parse(bytes: &[u8]) -> Result<Self, InferenceError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| InferenceError::ParseFailure("file is not valid UTF-8 text".into()))?;

        let mut lines = text.lines().filter(|l| !l.trim().is_empty());

        let header = lines
            .next()
            .ok_or_else(|| InferenceError::ParseFailure("file is empty".into()))?;
        let columns: Vec<String> = header
            .split(',')
            .map(|c| c.trim().trim_matches('"').to_string())
            .collect();
        if columns.iter().all(|c| c.is_empty()) {
            return Err(InferenceError::ParseFailure("header row is empty".into()));
        }

        let mut rows = Vec::new();
        for line in lines {
            let cells: Vec<Option<f64>> = line
                .split(',')
                .map(|c| c.trim().parse::<f64>().ok())
                .collect();
            rows.push(cells);
        }

        if rows.is_empty() {
            return Err(InferenceError::ParseFailure(
                "no data rows after the header".into(),
            ));
        }

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// First sample with the missing-value policy applied: every missing or
    /// uncoercible cell becomes 0.
    ///
    /// Domain caveat: this conflates "not measured" with "measured zero".
    /// Kept deliberately — the gene classifier was trained against 0-filled
    /// data. The marker pipeline uses the opposite policy.
    pub fn first_row_filled(&self) -> Vec<f64> {
        if self.rows.len() > 1 {
            tracing::warn!(
                extra_rows = self.rows.len() - 1,
                "expression upload has multiple sample rows; scoring the first only"
            );
        }
        let row = &self.rows[0];
        self.columns
            .iter()
            .enumerate()
            .map(|(i, _)| row.get(i).copied().flatten().unwrap_or(0.0))
            .collect()
    }
}
