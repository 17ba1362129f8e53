use anyhow::Result;
use serde_json::Value;

pub(crate) fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("{label:<16} {value}");
}
