use std::collections::HashMap;

/// Parse `KEY=value` lines.
/// Blank lines, `#` comments and lines without `=` are skipped; the first `=`
/// separates key from value and the value is kept verbatim (no unquoting).
pub fn parse_key_value_file(text: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        values.insert(key.to_string(), value.to_string());
    }
    values
}
