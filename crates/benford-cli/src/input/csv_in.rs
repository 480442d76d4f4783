use super::file::resolve_path;

/// Read one numeric column of a CSV file.
///
/// Blank or unparsable cells become missing values so that row positions in
/// the analysis line up with the file.
pub fn read_column(
    path: &str,
    column: &str,
) -> Result<Vec<Option<f64>>, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let mut rdr = csv::Reader::from_path(&canonical)
        .map_err(|e| format!("Failed to open '{}': {}", canonical.display(), e))?;

    let headers = rdr.headers()?.clone();
    let idx = headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| {
            format!(
                "Column '{}' not found in '{}' (available: {})",
                column,
                canonical.display(),
                headers.iter().collect::<Vec<_>>().join(", ")
            )
        })?;

    let mut values = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let cell = record.get(idx).unwrap_or_default().trim();
        values.push(cell.parse::<f64>().ok().filter(|v| v.is_finite()));
    }
    tracing::debug!(path = %canonical.display(), column, rows = values.len(), "csv column loaded");
    Ok(values)
}
