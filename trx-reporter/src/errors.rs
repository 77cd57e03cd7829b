// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by trx-reporter.

use camino::Utf8PathBuf;
use thiserror::Error;

/// An error that occurred while resolving metadata for a test.
///
/// These point at a broken environment (a missing or stale test binary, or a test name that
/// doesn't match the binary), so they aren't recoverable locally.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// The qualified name could not be split into a class and a method.
    #[error("qualified name `{qualified_name}` is not of the form `class.method`")]
    MalformedName {
        /// The qualified name.
        qualified_name: String,
    },

    /// The test binary could not be read.
    #[error("error loading test binary metadata from {path}")]
    LoadFailed {
        /// The path that was read.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The metadata for a test binary could not be parsed.
    #[error("invalid test binary metadata in {path}")]
    InvalidManifest {
        /// The path that was read.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: serde_json::Error,
    },

    /// Loading the test binary failed earlier in this run.
    ///
    /// The original failure is returned for the first test that points at the binary.
    #[error("test binary {path} failed to load earlier in this run")]
    BinaryUnavailable {
        /// The test binary.
        path: Utf8PathBuf,
    },

    /// The declaring class was not found in the test binary.
    #[error("class `{class_name}` not found in {source_path}")]
    TypeNotFound {
        /// The class that was looked up.
        class_name: String,

        /// The test binary.
        source_path: Utf8PathBuf,
    },

    /// The test method was not found on its class.
    #[error("method `{method_name}` not found on class `{class_name}` in {source_path}")]
    MethodNotFound {
        /// The class that was searched.
        class_name: String,

        /// The method that was looked up.
        method_name: String,

        /// The test binary.
        source_path: Utf8PathBuf,
    },
}

/// An error that occurred while writing a TRX report to disk.
#[derive(Debug, Error)]
pub enum WriteReportError {
    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,

        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while producing TRX XML.
    #[error("error writing TRX output to {file}")]
    Serialize {
        /// The output file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_trx::SerializeError,
    },
}

/// An error that occurred while generating a report at the end of a run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Resolving test metadata failed, and the failure policy is to abort.
    #[error("error resolving metadata for test `{qualified_name}`")]
    Metadata {
        /// The test whose metadata could not be resolved.
        qualified_name: String,

        /// The underlying error.
        #[source]
        error: MetadataError,
    },

    /// Writing the report failed.
    #[error(transparent)]
    Write(#[from] WriteReportError),

    /// The run was already reported complete.
    #[error("the run was already reported complete")]
    AlreadyCompleted,

    /// The reporter's worker thread shut down before the run completed.
    #[error("the reporter shut down before the run completed")]
    ReporterShutDown,
}

/// An error that occurred while reading TRX reporter configuration.
#[derive(Debug, Error)]
pub enum ConfigParseError {
    /// The config file could not be read.
    #[error("error reading config file {path}")]
    Read {
        /// The config file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The config could not be parsed.
    #[error("error parsing config from {origin}")]
    Parse {
        /// Where the config came from: a file path, or `<string>` for inline config.
        origin: String,

        /// The underlying error.
        #[source]
        error: toml::de::Error,
    },
}
