//*** START FILE: src/records_io.rs ***//
use crate::error::DocumentError;
use crate::types::article_data::QaRecord;
use std::fs::File;
use std::io::{BufReader, BufWriter, Error as IoError, ErrorKind as IoErrorKind, Write};
use std::path::Path;

/// Saves accepted records to a pretty-printed JSON array.
pub fn save_records(records: &[QaRecord], file_path: &Path) -> Result<(), DocumentError> {
    let file = File::create(file_path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Loads records written by [`save_records`].
pub fn load_records(file_path: &Path) -> Result<Vec<QaRecord>, DocumentError> {
    if !file_path.exists() {
        return Err(DocumentError::Io(IoError::new(
            IoErrorKind::NotFound,
            format!("record file not found at {:?}", file_path),
        )));
    }

    let file = File::open(file_path)?;
    let reader = BufReader::new(file);
    let records: Vec<QaRecord> = serde_json::from_reader(reader)?;
    Ok(records)
}

//*** END FILE: src/records_io.rs ***//
