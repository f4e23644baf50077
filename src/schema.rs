// Header parsing: turns the first CSV line into an ordered list of fields,
// each tagged as a file reference or a scalar.

use crate::catalog::Catalog;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("column {column} of the header is empty")]
    EmptyField { column: usize },

    #[error("'{name}' in column {column} is not a recognised argument name")]
    UnknownField { name: String, column: usize },

    #[error("'{name}' appears more than once in the header")]
    DuplicateField { name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    File,
    Scalar,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

/// Validated CSV header. Field order matches column order.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Validate header cells against the catalog. Columns are checked left
    /// to right and the first problem found is returned.
    pub fn from_headers<I, S>(catalog: &Catalog, headers: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fields: Vec<Field> = Vec::new();
        for (idx, cell) in headers.into_iter().enumerate() {
            let name = cell.as_ref();
            let column = idx + 1;
            if name.is_empty() {
                return Err(SchemaError::EmptyField { column });
            }
            if !catalog.is_known(name) {
                return Err(SchemaError::UnknownField { name: name.to_string(), column });
            }
            if fields.iter().any(|f| f.name == name) {
                return Err(SchemaError::DuplicateField { name: name.to_string() });
            }
            let kind = if catalog.is_file_field(name) { FieldKind::File } else { FieldKind::Scalar };
            fields.push(Field { name: name.to_string(), kind });
        }
        Ok(Schema { fields })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(headers: &[&str]) -> Result<Schema, SchemaError> {
        Schema::from_headers(&Catalog::default(), headers)
    }

    #[test]
    fn accepts_known_fields_in_order() {
        let schema = load(&["target_type", "file_image", "asset_file"]).unwrap();
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.fields()[2].name, "asset_file");
        assert_eq!(schema.fields()[0].kind, FieldKind::Scalar);
        assert_eq!(schema.fields()[1].kind, FieldKind::File);
    }

    #[test]
    fn rejects_duplicates() {
        assert_eq!(
            load(&["target_type", "target_type"]).unwrap_err(),
            SchemaError::DuplicateField { name: "target_type".into() }
        );
    }

    #[test]
    fn rejects_unknown_field() {
        assert_eq!(
            load(&["target_type", "foo_bar"]).unwrap_err(),
            SchemaError::UnknownField { name: "foo_bar".into(), column: 2 }
        );
    }

    #[test]
    fn rejects_empty_field() {
        assert_eq!(
            load(&["target_type", "", "url_video"]).unwrap_err(),
            SchemaError::EmptyField { column: 2 }
        );
    }

    #[test]
    fn names_are_not_trimmed() {
        assert!(matches!(
            load(&[" target_type"]).unwrap_err(),
            SchemaError::UnknownField { .. }
        ));
    }

    #[test]
    fn empty_header_is_an_empty_schema() {
        assert!(load(&[]).unwrap().is_empty());
    }
}
