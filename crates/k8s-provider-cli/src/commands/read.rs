//! Read command - read a live object through its data source

use std::path::Path;

use crate::GlobalArgs;
use crate::display;
use crate::error::Result;

pub async fn run(global: &GlobalArgs, type_name: &str, file: &Path) -> Result<()> {
    let provider = super::configured_provider(global).await?;
    let data_source = super::data_source(&provider, type_name)?;

    let config = super::read_input(file)?;
    super::check_config(&data_source.validate_config(&config))?;

    let response = data_source.read(&config).await;
    display::check("Read", &response.diagnostics)?;
    display::state(response.state.as_ref())
}
