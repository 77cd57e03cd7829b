// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Writing assembled reports to disk.

use crate::{config::HostIdentity, errors::WriteReportError};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, FixedOffset};
use quick_trx::TestRun;
use std::{
    fs::File,
    io::{BufWriter, Write},
};
use tracing::info;

/// The extension used for TRX reports.
pub const TRX_EXTENSION: &str = "trx";

/// Returns the file name for a report written at `now`: `user_machine yyyy-MM-dd HH_mm_ss.trx`.
pub fn report_file_name(identity: &HostIdentity, now: DateTime<FixedOffset>) -> String {
    format!(
        "{}_{} {}.{TRX_EXTENSION}",
        identity.user_name,
        identity.machine_name,
        now.format("%Y-%m-%d %H_%M_%S"),
    )
}

/// Serializes `run` into `dir`, creating the directory if needed.
///
/// An existing report with the same name is overwritten. Returns the path that was written.
pub fn write_report(
    run: &TestRun,
    dir: &Utf8Path,
    identity: &HostIdentity,
    now: DateTime<FixedOffset>,
) -> Result<Utf8PathBuf, WriteReportError> {
    std::fs::create_dir_all(dir).map_err(|error| WriteReportError::Fs {
        file: dir.to_owned(),
        error,
    })?;

    let path = dir.join(report_file_name(identity, now));
    let f = File::create(&path).map_err(|error| WriteReportError::Fs {
        file: path.clone(),
        error,
    })?;
    let mut writer = BufWriter::new(f);
    run.serialize(&mut writer)
        .map_err(|error| WriteReportError::Serialize {
            file: path.clone(),
            error,
        })?;
    writer.flush().map_err(|error| WriteReportError::Fs {
        file: path.clone(),
        error,
    })?;

    info!(%path, "wrote TRX report");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use quick_trx::{RunUuid, Times};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(-5 * 3600)
            .expect("valid offset")
            .with_ymd_and_hms(2024, 11, 5, 17, 8, 9)
            .single()
            .expect("unambiguous")
    }

    fn identity() -> HostIdentity {
        HostIdentity::new("ci", "BUILD01", "CORP")
    }

    #[test]
    fn file_name_format() {
        assert_eq!(
            report_file_name(&identity(), now()),
            "ci_BUILD01 2024-11-05 17_08_09.trx"
        );
    }

    #[test]
    fn writes_into_new_directory() {
        let temp = Utf8TempDir::new().expect("created temp dir");
        let dir = temp.path().join("nested").join("TestResults");
        let run = TestRun::new(
            RunUuid::new_v4(),
            "ci@BUILD01 2024-11-05 17:08:00",
            "CORP\\ci",
            Times::new(now(), now()),
        );

        let path = write_report(&run, &dir, &identity(), now()).expect("report written");
        assert_eq!(path, dir.join("ci_BUILD01 2024-11-05 17_08_09.trx"));

        let contents = std::fs::read_to_string(&path).expect("report readable");
        assert!(
            contents.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#),
            "{contents}"
        );
        assert!(contents.contains(r#"runUser="CORP\ci""#), "{contents}");
    }

    #[test]
    fn directory_is_a_file() {
        let temp = Utf8TempDir::new().expect("created temp dir");
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "").expect("wrote file");
        let run = TestRun::new(RunUuid::new_v4(), "run", "user", Times::new(now(), now()));

        let error = write_report(&run, &blocker.join("TestResults"), &identity(), now())
            .expect_err("parent is a file");
        assert!(matches!(error, WriteReportError::Fs { .. }), "{error:?}");
    }
}
