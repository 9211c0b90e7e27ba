//! Manifest command - render a manifest offline

use k8s_provider_crd::names;
use std::path::Path;

use crate::GlobalArgs;
use crate::display;
use crate::error::{CliError, Result};

pub async fn run(global: &GlobalArgs, type_name: &str, file: &Path) -> Result<()> {
    let provider = super::unconfigured_provider(global)?;
    let name = if type_name.ends_with("_manifest") {
        type_name.to_string()
    } else {
        format!("{}_manifest", type_name)
    };
    if provider.catalog().get_manifest(&name).is_none() {
        return Err(CliError::unknown_type("manifest data source", type_name));
    }
    let manifest = super::data_source(&provider, &name)?;

    let config = super::read_input(file)?;
    super::check_config(&manifest.validate_config(&config))?;

    let response = manifest.read(&config).await;
    display::check("Manifest rendering", &response.diagnostics)?;

    if let Some(yaml) = response
        .state
        .as_ref()
        .and_then(|state| state.get(names::YAML))
        .and_then(|yaml| yaml.as_str())
    {
        print!("{}", yaml);
    }
    Ok(())
}
