//! Default-config command implementation

use miette::{IntoDiagnostic, Result};
use serde_json::Value;
use tidyup_core::{Config, ToolRegistry};
use tidyup_tools::builtin_registry;

pub fn run_default_config() -> Result<()> {
    let document = default_document(&builtin_registry())?;
    println!("{}", serde_json::to_string_pretty(&document).into_diagnostic()?);
    Ok(())
}

/// Default configuration with empty tool option blocks left out.
fn default_document(registry: &ToolRegistry) -> Result<Value> {
    let mut document = serde_json::to_value(Config::defaults(registry)).into_diagnostic()?;
    if let Some(tools) = document.get_mut("tools").and_then(Value::as_object_mut) {
        for tool in tools.values_mut() {
            if let Some(tool) = tool.as_object_mut() {
                let empty = tool
                    .get("options")
                    .and_then(Value::as_object)
                    .is_some_and(|options| options.is_empty());
                if empty {
                    tool.remove("options");
                }
            }
        }
    }
    Ok(document)
}
