use crate::commands::Outcome;
use crate::config::StampConfig;
use crate::error::Result;

/// Print the JSON schema of stamp.config.json to stdout.
pub fn execute() -> Result<Outcome> {
    println!("{}", serde_json::to_string_pretty(&StampConfig::json_schema())?);
    Ok(Outcome::Success)
}
