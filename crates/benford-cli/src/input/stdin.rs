use serde_json::Value;
use std::io::{self, Read};

/// What was piped on stdin.
pub enum StdinPayload {
    /// A JSON document (full analysis input or a bare array).
    Json(Value),
    /// Plain numbers separated by whitespace, commas or newlines.
    Values(Vec<Option<f64>>),
}

/// Attempt to read piped input from stdin.
/// Returns None if stdin is a TTY (interactive) or empty.
pub fn read_stdin() -> Result<Option<StdinPayload>, Box<dyn std::error::Error>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;

    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        let value: Value = serde_json::from_str(trimmed)?;
        return Ok(Some(StdinPayload::Json(value)));
    }

    Ok(Some(StdinPayload::Values(parse_values(trimmed))))
}

fn parse_values(text: &str) -> Vec<Option<f64>> {
    text.split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|tok| !tok.is_empty())
        .map(|tok| tok.parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_values_mixed_separators() {
        let v = parse_values("1.5, 2\n-3;NA 4e2");
        assert_eq!(v, vec![Some(1.5), Some(2.0), Some(-3.0), None, Some(400.0)]);
    }
}
