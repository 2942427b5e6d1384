//! # tidyup_tools
//!
//! Native analysis tools for tidyup.
//!
//! Every tool implements [`tidyup_core::Tool`] and scans the files the
//! [`tidyup_core::Finder`] selects with its configured filters. Files are
//! examined in parallel with rayon.
//!
//! | Tool | Codes |
//! |------|-------|
//! | `jsonlint` | `syntax`, `eof`, `data` |
//! | `secrets` | `secret` |
//! | `todo` | `todo` |
//! | `whitespace` | `trailing`, `tab-indent`, `line-length`, `final-newline`, `blank-eof` |

mod jsonlint;
mod scan;
mod secrets;
mod todo;
mod whitespace;

pub use jsonlint::JsonLint;
pub use secrets::Secrets;
pub use todo::Todo;
pub use whitespace::Whitespace;

use tidyup_core::ToolRegistry;

/// File filters for plain text sources most tools look at.
pub const TEXT_FILTERS: &[&str] = &[
    r"\.(c|cc|cpp|go|h|hpp|java|rs)$",
    r"\.(css|html|js|jsx|ts|tsx|xml)$",
    r"\.(py|pyi|rb|sh|sql)$",
    r"\.(cfg|ini|json|toml|ya?ml)$",
    r"\.(md|rst|txt)$",
];

/// Registry holding every built-in tool.
pub fn builtin_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry
        .register(JsonLint)
        .register(Secrets::new())
        .register(Todo)
        .register(Whitespace);
    registry
}
