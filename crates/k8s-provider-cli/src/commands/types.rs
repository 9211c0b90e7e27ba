//! Types command - list registered resource and data source types

use serde_json::json;

use crate::GlobalArgs;
use crate::display;
use crate::error::Result;

pub fn run(global: &GlobalArgs, json_output: bool) -> Result<()> {
    let provider = super::unconfigured_provider(global)?;
    let resources: Vec<String> = provider.resources().iter().map(|r| r.type_name()).collect();
    let data_sources: Vec<String> = provider
        .data_sources()
        .iter()
        .map(|d| d.type_name())
        .collect();

    if json_output {
        return display::json(&json!({
            "resources": resources,
            "data_sources": data_sources,
        }));
    }

    for name in &resources {
        display::type_line("resource", name);
    }
    for name in &data_sources {
        display::type_line("data source", name);
    }
    Ok(())
}
