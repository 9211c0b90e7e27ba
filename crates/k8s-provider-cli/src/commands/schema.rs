//! Schema command - print schemas as JSON

use crate::GlobalArgs;
use crate::display;
use crate::error::Result;

pub fn run(global: &GlobalArgs, type_name: Option<&str>, data_source: bool) -> Result<()> {
    let provider = super::unconfigured_provider(global)?;
    match type_name {
        None => display::json(&provider.schema()),
        Some(name) if data_source => display::json(super::data_source(&provider, name)?.schema()),
        Some(name) => display::json(super::resource(&provider, name)?.schema()),
    }
}
