// Deploy upload body: the artifact as a single-entry ZIP
//
// The entry carries an extra field describing the transfer, which the legacy
// admin listener reads to decide how to store the payload.

use chrono::{DateTime, Datelike, Timelike, Utc};
use glassadmin_core::port::{CommandError, ErrorKind};
use std::io::{Cursor, Write};
use std::path::Path;
use zip::write::FullFileOptions;
use zip::CompressionMethod;

pub const ZIP_CONTENT_TYPE: &str = "application/zip";

/// Extra field header id of the transfer descriptor
pub const TRANSFER_EXTRA_ID: u16 = 0x4746;

/// Artifact read into memory, ready to be packed per attempt
#[derive(Debug, Clone)]
pub struct UploadArtifact {
    pub file_name: String,
    pub data: Vec<u8>,
    pub modified: DateTime<Utc>,
}

impl UploadArtifact {
    /// # Errors
    /// `ErrorKind::InvalidPath` when the file cannot be read
    pub async fn load(path: &Path) -> Result<Self, CommandError> {
        let invalid = |e: std::io::Error| {
            CommandError::new(ErrorKind::InvalidPath, format!("{}: {e}", path.display()))
        };
        let metadata = tokio::fs::metadata(path).await.map_err(invalid)?;
        let data = tokio::fs::read(path).await.map_err(invalid)?;
        let modified = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| {
                CommandError::new(ErrorKind::InvalidPath, format!("{} has no file name", path.display()))
            })?;
        Ok(Self {
            file_name,
            data,
            modified,
        })
    }

    /// Transfer descriptor stored in the entry's extra field
    pub fn descriptor(&self) -> String {
        format!(
            "data-request-type=file-xfer\ndata-request-name=DEFAULT\ndata-request-is-recursive=false\nlast-modified={}\nContent-Type=application/octet-stream\n",
            self.modified.timestamp_millis()
        )
    }

    /// Pack into a ZIP archive with one entry named after the artifact
    ///
    /// # Errors
    /// `ErrorKind::Protocol` when the archive cannot be written
    pub fn to_zip(&self) -> Result<Vec<u8>, CommandError> {
        let zip_err = |e: zip::result::ZipError| {
            CommandError::new(ErrorKind::Protocol, format!("packing {}: {e}", self.file_name))
        };

        let mut options = FullFileOptions::default().compression_method(CompressionMethod::Deflated);
        if let Ok(time) = zip::DateTime::from_date_and_time(
            self.modified.year().clamp(1980, 2107) as u16,
            self.modified.month() as u8,
            self.modified.day() as u8,
            self.modified.hour() as u8,
            self.modified.minute() as u8,
            self.modified.second() as u8,
        ) {
            options = options.last_modified_time(time);
        }
        let descriptor: Box<[u8]> = self.descriptor().into_bytes().into_boxed_slice();
        options
            .add_extra_data(TRANSFER_EXTRA_ID, descriptor, false)
            .map_err(zip_err)?;

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file(self.file_name.as_str(), options).map_err(zip_err)?;
        writer.write_all(&self.data).map_err(|e| {
            CommandError::new(ErrorKind::Protocol, format!("packing {}: {e}", self.file_name))
        })?;
        let cursor = writer.finish().map_err(zip_err)?;
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[tokio::test]
    async fn test_single_entry_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello.war");
        std::fs::write(&path, b"war bytes").unwrap();

        let artifact = UploadArtifact::load(&path).await.unwrap();
        let bytes = artifact.to_zip().unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut entry = archive.by_index(0).unwrap();
        assert_eq!(entry.name(), "hello.war");
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"war bytes");
    }

    #[tokio::test]
    async fn test_missing_file_is_invalid_path() {
        let err = UploadArtifact::load(Path::new("/nonexistent/app.war"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);
    }

    #[test]
    fn test_descriptor_names_transfer_type() {
        let artifact = UploadArtifact {
            file_name: "a.war".into(),
            data: Vec::new(),
            modified: Utc::now(),
        };
        assert!(artifact.descriptor().starts_with("data-request-type=file-xfer\n"));
    }
}
