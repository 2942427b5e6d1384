//! Extensions command implementation

use miette::Result;
use tidyup_core::{ReportRegistry, ToolRegistry};
use tidyup_tools::builtin_registry;

use crate::cli::ListFormat;
use crate::output::{Listing, render_listing};

pub fn run_extensions(format: ListFormat) -> Result<()> {
    let listing = collect_extensions(&builtin_registry(), &ReportRegistry::builtin());
    print!("{}", render_listing(&listing, format, ["type", "name", "description"])?);
    Ok(())
}

/// Available tools and reports with their descriptions.
fn collect_extensions(tools: &ToolRegistry, reports: &ReportRegistry) -> Listing {
    let mut listing = Listing::new();
    listing.insert(
        "tools".to_string(),
        tools
            .iter()
            .map(|tool| (tool.name().to_string(), tool.description().to_string()))
            .collect(),
    );
    listing.insert(
        "reports".to_string(),
        reports
            .iter()
            .map(|report| (report.name().to_string(), report.description().to_string()))
            .collect(),
    );
    listing
}
