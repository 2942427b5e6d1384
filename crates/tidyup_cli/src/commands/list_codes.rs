//! List-codes command implementation

use miette::{Result, miette};
use tidyup_core::ToolRegistry;
use tidyup_tools::builtin_registry;

use crate::cli::ListFormat;
use crate::output::{Listing, render_listing};

pub fn run_list_codes(tools: &[String], format: ListFormat) -> Result<()> {
    let codes = collect_codes(&builtin_registry(), tools)?;
    print!("{}", render_listing(&codes, format, ["tool", "code", "message"])?);
    Ok(())
}

fn collect_codes(registry: &ToolRegistry, tools: &[String]) -> Result<Listing> {
    let names: Vec<&str> = if tools.is_empty() {
        registry.names().collect()
    } else {
        tools.iter().map(String::as_str).collect()
    };

    let mut listing = Listing::new();
    for name in names {
        let tool = registry
            .get(name)
            .ok_or_else(|| miette!("Unknown tool: {}", name))?;
        let codes = tool
            .all_codes()
            .into_iter()
            .map(|info| (info.code, info.description))
            .collect();
        listing.insert(name.to_string(), codes);
    }
    Ok(listing)
}
