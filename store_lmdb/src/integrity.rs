//! LMDB integrity checks.
//!
//! Run on every open so corruption is detected before any stage of the
//! bootstrap pipeline trusts the store's contents.

use std::sync::Arc;

use heed::Env;

use crate::LmdbError;

/// Summary of an integrity check run.
pub struct IntegrityReport {
    pub databases_checked: u32,
    pub total_entries: u64,
    pub errors: Vec<String>,
}

impl IntegrityReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }

    /// Turn an unhealthy report into an error.
    pub fn into_result(self) -> Result<Self, LmdbError> {
        if self.is_healthy() {
            Ok(self)
        } else {
            Err(LmdbError::Integrity(self.errors.join("; ")))
        }
    }
}

/// Open each expected database and count its entries.
///
/// Every database listed is expected to exist; the stores create them on
/// open, so a missing one means the file was damaged. Read failures are
/// recorded in the report rather than returned early.
pub fn check_integrity(env: &Arc<Env>, expected: &[&str]) -> Result<IntegrityReport, LmdbError> {
    let mut report = IntegrityReport {
        databases_checked: 0,
        total_entries: 0,
        errors: Vec::new(),
    };

    let rtxn = env.read_txn()?;

    for &db_name in expected {
        match env.open_database::<heed::types::Bytes, heed::types::Bytes>(&rtxn, Some(db_name)) {
            Ok(Some(db)) => {
                report.databases_checked += 1;
                match db.len(&rtxn) {
                    Ok(count) => {
                        report.total_entries += count;
                    }
                    Err(e) => {
                        report
                            .errors
                            .push(format!("failed to read database '{}': {}", db_name, e));
                    }
                }
            }
            Ok(None) => {
                report
                    .errors
                    .push(format!("database '{}' is missing", db_name));
            }
            Err(e) => {
                report
                    .errors
                    .push(format!("failed to open database '{}': {}", db_name, e));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LmdbEnvironment;

    #[test]
    fn healthy_report() {
        let report = IntegrityReport {
            databases_checked: 2,
            total_entries: 100,
            errors: Vec::new(),
        };
        assert!(report.is_healthy());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn unhealthy_report() {
        let report = IntegrityReport {
            databases_checked: 2,
            total_entries: 100,
            errors: vec!["corruption detected".to_string()],
        };
        assert!(!report.is_healthy());
        assert!(matches!(report.into_result(), Err(LmdbError::Integrity(_))));
    }

    #[test]
    fn missing_database_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let env = LmdbEnvironment::open(&dir.path().join("store"), 4, 1024 * 1024).expect("env");
        env.create_database("present").expect("db");

        let report = check_integrity(env.env(), &["present", "absent"]).expect("check");
        assert_eq!(report.databases_checked, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("absent"));
    }
}
