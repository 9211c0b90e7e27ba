//! Apply command - create or update an object through its resource

use console::style;
use std::path::Path;

use crate::GlobalArgs;
use crate::display;
use crate::error::Result;

pub async fn run(
    global: &GlobalArgs,
    type_name: &str,
    file: &Path,
    state: Option<&Path>,
) -> Result<()> {
    let provider = super::configured_provider(global).await?;
    let resource = super::resource(&provider, type_name)?;

    let plan = super::read_input(file)?;
    super::check_config(&resource.validate_config(&plan))?;

    let response = match state {
        None => resource.create(&plan).await,
        Some(path) => {
            let prior = super::read_input(path)?;
            let planned = resource.modify_plan(&prior, &plan);
            display::check("Plan", &planned.diagnostics)?;

            if planned.requires_replace.is_empty() {
                resource.update(&prior, &plan).await
            } else {
                let paths: Vec<String> = planned
                    .requires_replace
                    .iter()
                    .map(|p| p.to_string())
                    .collect();
                eprintln!(
                    "{} {} must be replaced: {} changed",
                    style("→").blue(),
                    type_name,
                    paths.join(", ")
                );
                display::check("Delete", &resource.delete(&prior).await)?;
                resource.create(&plan).await
            }
        }
    };

    // a failed upsert wait still returns the applied state
    let result = display::check("Apply", &response.diagnostics);
    display::state(response.state.as_ref())?;
    result
}
