use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::github::HookId;

/// Concourse version object for a put: the hook id, always as a string.
#[derive(Debug, Serialize)]
pub struct VersionOutput {
    version: Version,
}

#[derive(Debug, Serialize)]
struct Version {
    id: String,
}

impl VersionOutput {
    pub fn new(id: &HookId) -> Self {
        Self {
            version: Version { id: id.to_string() },
        }
    }
}

/// Prints the version object on stdout. Stdout is the protocol surface
/// Concourse parses, so nothing else in this program may write to it.
pub fn emit(id: &HookId) -> Result<()> {
    let rendered = serde_json::to_string_pretty(&VersionOutput::new(id))
        .context("couldn't serialize version output")?;
    info!("emitting version {}", rendered);
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_are_stringified() {
        let output = VersionOutput::new(&HookId::Number(42));
        let rendered = serde_json::to_string(&output).unwrap();

        assert_eq!(rendered, r#"{"version":{"id":"42"}}"#);
    }

    #[test]
    fn string_ids_pass_through() {
        let output = VersionOutput::new(&HookId::Text("abc-123".to_string()));
        let rendered = serde_json::to_string(&output).unwrap();

        assert_eq!(rendered, r#"{"version":{"id":"abc-123"}}"#);
    }
}
