//! Validate command - check a configuration against a type's schema

use console::style;
use std::path::Path;

use crate::GlobalArgs;
use crate::error::Result;

pub fn run(global: &GlobalArgs, type_name: &str, file: &Path, data_source: bool) -> Result<()> {
    let provider = super::unconfigured_provider(global)?;
    let config = super::read_input(file)?;

    let diags = if data_source {
        super::data_source(&provider, type_name)?.validate_config(&config)
    } else {
        super::resource(&provider, type_name)?.validate_config(&config)
    };
    super::check_config(&diags)?;

    println!(
        "{} {} is a valid {} configuration",
        style("✓").green(),
        file.display(),
        type_name
    );
    Ok(())
}
