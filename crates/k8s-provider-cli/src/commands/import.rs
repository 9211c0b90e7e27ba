//! Import command - adopt an existing object into a resource state

use crate::GlobalArgs;
use crate::display;
use crate::error::{CliError, Result};

pub async fn run(global: &GlobalArgs, type_name: &str, id: &str) -> Result<()> {
    let provider = super::configured_provider(global).await?;
    let resource = super::resource(&provider, type_name)?;

    let imported = resource.import_state(id);
    if imported.has_error() {
        display::diagnostics(&imported.diagnostics);
        return Err(CliError::input_with_help(
            format!("'{}' is not a valid identifier for {}", id, type_name),
            "use `name` for cluster-scoped kinds and `namespace/name` for namespaced kinds",
        ));
    }
    let Some(seed) = imported.state else {
        return Ok(());
    };

    let response = resource.read(&seed).await;
    display::check("Import", &response.diagnostics)?;
    display::state(response.state.as_ref())
}
