//! Credentials CSV export
//!
//! One row per generated user, in the column order load-testing tools read:
//! `email,username,password,access_token,user_id,account_id`.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AppError;

/// Header written once at the top of every export
pub const HEADER: [&str; 6] = [
    "email",
    "username",
    "password",
    "access_token",
    "user_id",
    "account_id",
];

/// Credentials of one generated user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRow {
    pub email: String,
    pub username: String,
    pub password: String,
    pub access_token: String,
    pub user_id: String,
    pub account_id: String,
}

/// Incremental writer for the credentials file
///
/// Every row is flushed as soon as it is appended, so an interrupted run
/// leaves the rows written so far on disk. Each record is encoded on its
/// own before it reaches the output; a row whose write fails is dropped
/// and never resurfaces with a later row.
pub struct CredentialsWriter<W: Write = File> {
    out: W,
    rows: usize,
}

impl CredentialsWriter<File> {
    /// Create (or truncate) the file and write the header
    pub fn create(path: &Path) -> Result<Self, AppError> {
        let file = File::create(path)?;
        Self::new(file)
    }
}

impl<W: Write> CredentialsWriter<W> {
    /// Wrap `out` and write the header
    pub fn new(out: W) -> Result<Self, AppError> {
        let mut writer = Self { out, rows: 0 };
        let header = encode(|record| record.write_record(HEADER))?;
        writer.write_flushed(&header)?;
        Ok(writer)
    }

    /// Append one row and flush it to the output
    pub fn append(&mut self, row: &CredentialRow) -> Result<(), AppError> {
        let record = encode(|record| record.serialize(row))?;
        self.write_flushed(&record)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far, header excluded
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and close the output
    ///
    /// # Returns
    /// Number of rows written
    pub fn finish(mut self) -> Result<usize, AppError> {
        self.out.flush()?;
        Ok(self.rows)
    }

    fn write_flushed(&mut self, bytes: &[u8]) -> Result<(), AppError> {
        self.out.write_all(bytes)?;
        self.out.flush()?;
        Ok(())
    }
}

/// Encode a single CSV record into a fresh buffer
fn encode<F>(write: F) -> Result<Vec<u8>, AppError>
where
    F: FnOnce(&mut csv::Writer<Vec<u8>>) -> Result<(), csv::Error>,
{
    let mut record = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    write(&mut record)?;
    record
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}

/// Load an exported credentials file
pub fn read_credentials(path: &Path) -> Result<Vec<CredentialRow>, AppError> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<Result<Vec<CredentialRow>, csv::Error>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::io;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// In-memory output whose next write can be made to fail
    #[derive(Clone, Default)]
    struct FlakyOutput {
        written: Rc<RefCell<Vec<u8>>>,
        fail_next_write: Rc<Cell<bool>>,
    }

    impl FlakyOutput {
        fn contents(&self) -> String {
            String::from_utf8(self.written.borrow().clone()).unwrap()
        }
    }

    impl Write for FlakyOutput {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.fail_next_write.replace(false) {
                return Err(io::Error::other("no space left on device"));
            }
            self.written.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn row(n: usize) -> CredentialRow {
        CredentialRow {
            email: format!("testuser{n:04}@test.com"),
            username: format!("testuser{n:04}"),
            password: format!("TestPass{n}!"),
            access_token: format!("token-{n}"),
            user_id: format!("user-{n}"),
            account_id: format!("account-{n}"),
        }
    }

    #[test]
    fn header_is_written_even_without_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");

        let writer = CredentialsWriter::create(&path).unwrap();
        assert_eq!(writer.finish().unwrap(), 0);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            "email,username,password,access_token,user_id,account_id\n"
        );
        assert!(read_credentials(&path).unwrap().is_empty());
    }

    #[test]
    fn rows_are_visible_before_finish() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");

        let mut writer = CredentialsWriter::create(&path).unwrap();
        writer.append(&row(1)).unwrap();
        writer.append(&row(2)).unwrap();

        let rows = read_credentials(&path).unwrap();
        assert_eq!(rows, vec![row(1), row(2)]);
        assert_eq!(writer.rows(), 2);
    }

    #[test]
    fn create_truncates_previous_export() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");

        let mut writer = CredentialsWriter::create(&path).unwrap();
        writer.append(&row(1)).unwrap();
        writer.finish().unwrap();

        let writer = CredentialsWriter::create(&path).unwrap();
        writer.finish().unwrap();

        assert!(read_credentials(&path).unwrap().is_empty());
    }

    #[test]
    fn passwords_with_special_characters_survive() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.csv");
        let mut special = row(3);
        special.password = "Pass,with\"quotes\"!".to_string();

        let mut writer = CredentialsWriter::create(&path).unwrap();
        writer.append(&special).unwrap();
        writer.finish().unwrap();

        assert_eq!(read_credentials(&path).unwrap(), vec![special]);
    }

    #[test]
    fn failed_row_is_not_written_with_the_next_one() {
        let output = FlakyOutput::default();
        let mut writer = CredentialsWriter::new(output.clone()).unwrap();

        writer.append(&row(1)).unwrap();
        output.fail_next_write.set(true);
        assert!(writer.append(&row(2)).is_err());
        writer.append(&row(3)).unwrap();
        assert_eq!(writer.finish().unwrap(), 2);

        let contents = output.contents();
        assert!(contents.contains("testuser0001"));
        assert!(!contents.contains("testuser0002"));
        assert!(contents.contains("testuser0003"));

        let mut reader = csv::Reader::from_reader(contents.as_bytes());
        let rows = reader
            .deserialize()
            .collect::<Result<Vec<CredentialRow>, csv::Error>>()
            .unwrap();
        assert_eq!(rows, vec![row(1), row(3)]);
    }
}
