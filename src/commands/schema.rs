use crate::config::Config;

/// Print the JSON Schema for .pulse.toml.
pub fn run_schema() -> anyhow::Result<()> {
    let schema = schemars::schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
