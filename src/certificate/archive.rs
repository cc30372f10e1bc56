//! ZIP packing of generated certificates.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use super::GeneratedFile;

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("refusing to build an archive with no files")]
    EmptyArchiveRequest,
    #[error("archive already contains an entry named '{0}'")]
    DuplicateEntry(String),
    #[error("failed to write archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("failed to write archive entry: {0}")]
    Io(#[from] std::io::Error),
}

/// Pack every file into one deflate-compressed ZIP held in memory.
pub fn pack(files: &[GeneratedFile]) -> Result<Vec<u8>, ArchiveError> {
    if files.is_empty() {
        return Err(ArchiveError::EmptyArchiveRequest);
    }

    let mut seen = HashSet::with_capacity(files.len());
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for file in files {
        if !seen.insert(file.file_name.as_str()) {
            return Err(ArchiveError::DuplicateEntry(file.file_name.clone()));
        }
        writer.start_file(file.file_name.as_str(), options)?;
        writer.write_all(&file.bytes)?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}
