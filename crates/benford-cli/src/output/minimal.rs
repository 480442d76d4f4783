use serde_json::Value;

/// Print just the headline answer from the output.
///
/// Analyses print their MAD conformity verdict (or the MAD itself when no
/// verdict applies); ranked tables print one digit group or value per line.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = ["mad_conformity", "mad", "probability", "distortion_factor"];

    match result_obj {
        Value::Object(map) => {
            for key in &priority_keys {
                if let Some(val) = map.get(*key) {
                    if !val.is_null() {
                        println!("{}", format_minimal(val));
                        return;
                    }
                }
            }
            if let Some((key, val)) = map.iter().next() {
                println!("{}: {}", key, format_minimal(val));
                return;
            }
            println!("{}", format_minimal(result_obj));
        }
        Value::Array(rows) => {
            for row in rows {
                let key = row.get("digits").or_else(|| row.get("value"));
                println!("{}", format_minimal(key.unwrap_or(row)));
            }
        }
        _ => println!("{}", format_minimal(result_obj)),
    }
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
