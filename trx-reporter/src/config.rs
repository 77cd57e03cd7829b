// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for TRX report generation.
//!
//! Configuration is read from the `[trx]` table of a TOML file:
//!
//! ```toml
//! [trx]
//! dir = "target/test-results"
//! metadata-failure = "fallback"
//! ```

use crate::errors::ConfigParseError;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use tracing::warn;

/// The directory reports are written to if none is configured.
pub const DEFAULT_RESULTS_DIR: &str = "TestResults";

/// TRX reporter configuration.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TrxConfig {
    /// The directory the report is written to. Created if it doesn't exist.
    #[serde(default = "default_dir")]
    pub dir: Utf8PathBuf,

    /// Overrides the user name recorded in the report.
    #[serde(default)]
    pub user_name: Option<String>,

    /// Overrides the machine name recorded in the report.
    #[serde(default)]
    pub machine_name: Option<String>,

    /// Overrides the user domain recorded in the report.
    #[serde(default)]
    pub user_domain: Option<String>,

    /// What to do when metadata for a test can't be resolved.
    #[serde(default)]
    pub metadata_failure: MetadataFailurePolicy,
}

impl Default for TrxConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            user_name: None,
            machine_name: None,
            user_domain: None,
            metadata_failure: MetadataFailurePolicy::default(),
        }
    }
}

fn default_dir() -> Utf8PathBuf {
    DEFAULT_RESULTS_DIR.into()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ConfigFile {
    #[serde(default)]
    trx: TrxConfig,
}

impl TrxConfig {
    /// Reads configuration from a TOML file.
    pub fn from_path(path: &Utf8Path) -> Result<Self, ConfigParseError> {
        let contents = std::fs::read_to_string(path).map_err(|error| ConfigParseError::Read {
            path: path.to_owned(),
            error,
        })?;
        Self::parse(&contents, path.as_str())
    }

    /// Reads configuration from a TOML string.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigParseError> {
        Self::parse(contents, "<string>")
    }

    fn parse(contents: &str, origin: &str) -> Result<Self, ConfigParseError> {
        let file: ConfigFile =
            toml::from_str(contents).map_err(|error| ConfigParseError::Parse {
                origin: origin.to_owned(),
                error,
            })?;
        Ok(file.trx)
    }

    /// Resolves the identity of the user and machine running the tests.
    ///
    /// Configured values win. Otherwise the user and machine names come from the OS, and the
    /// domain comes from the `USERDOMAIN` environment variable, falling back to the machine name.
    pub fn host_identity(&self) -> HostIdentity {
        let user_name = self.user_name.clone().unwrap_or_else(|| {
            whoami::username().unwrap_or_else(|error| {
                warn!(%error, "unable to determine user name, using `unknown`");
                "unknown".to_owned()
            })
        });
        let machine_name = self.machine_name.clone().unwrap_or_else(|| {
            whoami::hostname().unwrap_or_else(|error| {
                warn!(%error, "unable to determine machine name, using `localhost`");
                "localhost".to_owned()
            })
        });
        let user_domain = self
            .user_domain
            .clone()
            .or_else(|| std::env::var("USERDOMAIN").ok())
            .unwrap_or_else(|| machine_name.clone());
        HostIdentity {
            user_name,
            machine_name,
            user_domain,
        }
    }
}

/// What to do when metadata for a test can't be resolved.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MetadataFailurePolicy {
    /// Abort the whole report. No file is written.
    #[default]
    Abort,

    /// Log a warning and fill in the definition from the result alone.
    Fallback,
}

/// The user and machine a report is attributed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostIdentity {
    /// The user name.
    pub user_name: String,

    /// The machine name.
    pub machine_name: String,

    /// The user's domain.
    pub user_domain: String,
}

impl HostIdentity {
    /// Creates a new `HostIdentity`.
    pub fn new(
        user_name: impl Into<String>,
        machine_name: impl Into<String>,
        user_domain: impl Into<String>,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            machine_name: machine_name.into(),
            user_domain: user_domain.into(),
        }
    }

    /// Returns the `domain\user` string recorded as the run user.
    pub fn run_user(&self) -> String {
        format!("{}\\{}", self.user_domain, self.user_name)
    }
}
