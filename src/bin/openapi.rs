//! Print the OpenAPI spec for the served routes as JSON.

use anyhow::Result;

fn main() -> Result<()> {
    let spec = questlog::api::openapi();
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}
