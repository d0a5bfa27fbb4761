//! Command-line interface.

pub mod commands;
pub mod context;
pub mod output;
pub mod types;

pub use context::AppContext;
pub use types::{Cli, Commands};

use crate::domain::errors::DomainError;
use crate::infrastructure::config::ConfigError;

/// Print an error in the requested format and exit with a non-zero code.
///
/// Exit codes: 2 for invalid input or configuration, 1 for everything else.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    let code = exit_code(&err);
    if json {
        let body = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(ToString::to_string).collect::<Vec<_>>(),
        });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err}");
        for cause in err.chain().skip(1) {
            eprintln!("  caused by: {cause}");
        }
    }
    std::process::exit(code)
}

fn exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.downcast_ref::<ConfigError>().is_some() {
            return 2;
        }
        if let Some(domain) = cause.downcast_ref::<DomainError>() {
            return match domain {
                DomainError::Validation(_) | DomainError::Configuration(_) => 2,
                _ => 1,
            };
        }
    }
    1
}
