// Row builder: turns one CSV data row into the form-data payload for a
// single upload. Files named by the row are opened here and owned by the
// payload; dropping the payload closes them.

use crate::schema::{FieldKind, Schema};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RowError {
    #[error("row has {found} columns but the header declares {expected}")]
    ColumnCount { expected: usize, found: usize },

    #[error("file argument '{field}' points to '{}': {source}", .path.display())]
    FilePath {
        field: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Credentials sent with every request.
#[derive(Debug, Clone)]
pub struct Identity {
    pub api_key: String,
    pub security_key: String,
    pub email: String,
}

/// A scalar form value. Cells start out as text; validators coerce some of
/// them to numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Float(f64),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Int(n) => write!(f, "{}", n),
            FieldValue::Float(x) => write!(f, "{}", x),
        }
    }
}

/// An opened file plus the name it is uploaded under.
#[derive(Debug)]
pub struct Attachment {
    pub file: File,
    pub file_name: String,
    pub path: PathBuf,
}

impl Attachment {
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        if !file.metadata()?.is_file() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"));
        }
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Attachment { file, file_name, path: path.to_path_buf() })
    }

    /// Extension of the uploaded file name without the dot, exactly as written.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.file_name).extension().and_then(|e| e.to_str())
    }
}

/// Form-data for one upload request.
#[derive(Debug, Default)]
pub struct RowPayload {
    pub fields: BTreeMap<String, FieldValue>,
    pub attachments: BTreeMap<String, Attachment>,
}

impl RowPayload {
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn has_attachment(&self, name: &str) -> bool {
        self.attachments.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(FieldValue::as_text)
    }

    pub fn set(&mut self, name: &str, value: FieldValue) {
        self.fields.insert(name.to_string(), value);
    }

    /// Move an attachment to a new key. Returns false when `from` is absent.
    pub fn rename_attachment(&mut self, from: &str, to: &str) -> bool {
        match self.attachments.remove(from) {
            Some(att) => {
                self.attachments.insert(to.to_string(), att);
                true
            }
            None => false,
        }
    }
}

/// Build the payload for one data row. Empty cells mean "not provided".
pub fn build_row(schema: &Schema, identity: &Identity, cells: &[&str]) -> Result<RowPayload, RowError> {
    if cells.len() != schema.len() {
        return Err(RowError::ColumnCount { expected: schema.len(), found: cells.len() });
    }

    let mut payload = RowPayload::default();
    payload.set("key", FieldValue::Text(identity.api_key.clone()));
    payload.set("secKey", FieldValue::Text(identity.security_key.clone()));
    payload.set("email", FieldValue::Text(identity.email.clone()));

    for (field, &cell) in schema.fields().iter().zip(cells) {
        if cell.is_empty() {
            continue;
        }
        match field.kind {
            FieldKind::File => {
                let path = PathBuf::from(cell);
                // An early return drops `payload`, closing files already opened for this row.
                let att = Attachment::open(&path).map_err(|source| RowError::FilePath {
                    field: field.name.clone(),
                    path: path.clone(),
                    source,
                })?;
                debug!(field = %field.name, path = %path.display(), "opened attachment");
                payload.attachments.insert(field.name.clone(), att);
            }
            FieldKind::Scalar => {
                payload.set(&field.name, FieldValue::Text(cell.to_string()));
            }
        }
    }
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use std::io::Write;

    fn identity() -> Identity {
        Identity {
            api_key: "k".into(),
            security_key: "s".into(),
            email: "me@example.com".into(),
        }
    }

    fn schema(headers: &[&str]) -> Schema {
        Schema::from_headers(&Catalog::default(), headers).unwrap()
    }

    #[test]
    fn skips_empty_cells_and_keeps_identity() {
        let s = schema(&["target_type", "url_image", "file_image"]);
        let row = build_row(&s, &identity(), &["0", "", ""]).unwrap();
        assert_eq!(row.text("target_type"), Some("0"));
        assert!(!row.has_field("url_image"));
        assert!(row.attachments.is_empty());
        assert_eq!(row.text("secKey"), Some("s"));
        assert_eq!(row.text("email"), Some("me@example.com"));
    }

    #[test]
    fn column_count_mismatch() {
        let s = schema(&["target_type", "url_video"]);
        let err = build_row(&s, &identity(), &["0"]).unwrap_err();
        assert!(matches!(err, RowError::ColumnCount { expected: 2, found: 1 }));
    }

    #[test]
    fn opens_file_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marker.png");
        std::fs::File::create(&path).unwrap().write_all(b"png").unwrap();

        let s = schema(&["target_type", "file_image"]);
        let cell = path.to_str().unwrap();
        let row = build_row(&s, &identity(), &["0", cell]).unwrap();
        let att = &row.attachments["file_image"];
        assert_eq!(att.file_name, "marker.png");
        assert_eq!(att.extension(), Some("png"));
        assert!(!row.has_field("file_image"));
    }

    #[test]
    fn missing_file_names_field_and_path() {
        let s = schema(&["asset_file"]);
        let err = build_row(&s, &identity(), &["/no/such/model.glb"]).unwrap_err();
        match err {
            RowError::FilePath { field, path, .. } => {
                assert_eq!(field, "asset_file");
                assert_eq!(path, PathBuf::from("/no/such/model.glb"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn directory_is_not_an_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("marker.png");
        std::fs::create_dir(&sub).unwrap();

        let s = schema(&["target_type", "file_image"]);
        let err = build_row(&s, &identity(), &["0", sub.to_str().unwrap()]).unwrap_err();
        match err {
            RowError::FilePath { field, path, source } => {
                assert_eq!(field, "file_image");
                assert_eq!(path, sub);
                assert_eq!(source.kind(), io::ErrorKind::InvalidInput);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rename_moves_attachment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"x").unwrap();
        let mut row = RowPayload::default();
        row.attachments.insert("asset_file".into(), Attachment::open(&path).unwrap());

        assert!(row.rename_attachment("asset_file", "file_video"));
        assert!(!row.has_attachment("asset_file"));
        assert!(row.has_attachment("file_video"));
        assert!(!row.rename_attachment("asset_file", "file_video"));
    }

    #[test]
    fn extension_edge_cases() {
        let dir = tempfile::tempdir().unwrap();
        for (name, expected) in [("model.", Some("")), ("noext", None), ("a.tar.gz", Some("gz"))] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"x").unwrap();
            assert_eq!(Attachment::open(&path).unwrap().extension(), expected, "{name}");
        }
    }
}
