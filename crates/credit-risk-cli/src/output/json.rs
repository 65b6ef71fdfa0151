use serde_json::Value;

/// Pretty-print the result as JSON. This is the default format and the
/// one other tools are expected to consume.
pub fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => eprintln!("failed to render JSON output: {}", e),
    }
}
