use std::env;

/// Build metadata Concourse injects into every resource container.
///
/// Snapshotted once at startup; nothing below the entry point reads the
/// process environment. Fields stay optional so that validation can report
/// missing variables together with missing payload fields.
#[derive(Debug, Default)]
pub struct BuildEnv {
    /// Public base URL of the ATC, used to build resource check callbacks
    pub external_url: Option<String>,
    /// Team the currently running build belongs to
    pub team_name: Option<String>,
    /// Pipeline the currently running build belongs to
    pub pipeline_name: Option<String>,
}

impl BuildEnv {
    pub fn from_env() -> Self {
        Self {
            external_url: env::var("ATC_EXTERNAL_URL").ok(),
            team_name: env::var("BUILD_TEAM_NAME").ok(),
            pipeline_name: env::var("BUILD_PIPELINE_NAME").ok(),
        }
    }
}
