//! Destroy command - delete the object of a resource state

use console::style;
use k8s_provider_crd::names;
use std::path::Path;

use crate::GlobalArgs;
use crate::display;
use crate::error::Result;

pub async fn run(global: &GlobalArgs, type_name: &str, file: &Path) -> Result<()> {
    let provider = super::configured_provider(global).await?;
    let resource = super::resource(&provider, type_name)?;

    let state = super::read_input(file)?;
    display::check("Delete", &resource.delete(&state).await)?;

    let id = state
        .get(names::ID)
        .and_then(|id| id.as_str())
        .unwrap_or(type_name);
    eprintln!("{} Destroyed {}", style("✓").green(), id);
    Ok(())
}
