//! Output formatting for the listing commands

use std::collections::BTreeMap;
use std::fmt::Write;

use miette::{IntoDiagnostic, Result};

use crate::cli::ListFormat;

/// Two level `section -> name -> description` listing.
pub type Listing = BTreeMap<String, BTreeMap<String, String>>;

/// Renders `listing` in `format`. `header` names the three CSV columns.
pub fn render_listing(listing: &Listing, format: ListFormat, header: [&str; 3]) -> Result<String> {
    Ok(match format {
        ListFormat::Toml => toml::to_string_pretty(listing).into_diagnostic()?,
        ListFormat::Yaml => serde_yaml::to_string(listing).into_diagnostic()?,
        ListFormat::Json => serde_json::to_string_pretty(listing).into_diagnostic()? + "\n",
        ListFormat::Csv => render_csv(listing, header),
    })
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(listing: &Listing, header: [&str; 3]) -> String {
    let mut out = header.join(",");
    out.push('\n');
    for (section, entries) in listing {
        for (name, description) in entries {
            let _ = writeln!(
                out,
                "{},{},{}",
                csv_field(section),
                csv_field(name),
                csv_field(description)
            );
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Listing {
        let mut listing = Listing::new();
        listing.insert(
            "alpha".to_string(),
            BTreeMap::from([
                ("b".to_string(), "Second, with comma".to_string()),
                ("a".to_string(), "First \"quoted\"".to_string()),
            ]),
        );
        listing.insert(
            "beta".to_string(),
            BTreeMap::from([("tab-indent".to_string(), "Third".to_string())]),
        );
        listing
    }

    #[test]
    fn test_render_toml() {
        let output = render_listing(&sample(), ListFormat::Toml, ["a", "b", "c"]).unwrap();
        assert!(output.contains("[alpha]\n"));
        assert!(output.contains("b = \"Second, with comma\"\n"));
        assert!(output.contains("[beta]\ntab-indent = \"Third\"\n"));

        let parsed: toml::Table = toml::from_str(&output).unwrap();
        assert_eq!(parsed["alpha"]["a"].as_str(), Some("First \"quoted\""));
    }

    #[test]
    fn test_render_yaml() {
        let output = render_listing(&sample(), ListFormat::Yaml, ["a", "b", "c"]).unwrap();
        let parsed: Listing = serde_yaml::from_str(&output).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_render_json() {
        let output = render_listing(&sample(), ListFormat::Json, ["a", "b", "c"]).unwrap();
        assert!(output.ends_with("}\n"));
        let parsed: Listing = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn test_render_csv() {
        assert_eq!(
            render_listing(&sample(), ListFormat::Csv, ["tool", "code", "message"]).unwrap(),
            "tool,code,message\nalpha,a,\"First \"\"quoted\"\"\"\nalpha,b,\"Second, with comma\"\nbeta,tab-indent,Third\n"
        );
    }
}
