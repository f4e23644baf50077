// Static lookup tables used by the schema loader and the validators.
// The tables are plain data: a `Catalog` is built once (normally from the
// built-in defaults) and passed by reference to whoever needs it, so a test
// can hand in a smaller or different table without touching globals.

use crate::types::HologramType;

/// Field names recognised in the CSV header.
pub const KNOWN_FIELDS: &[&str] = &[
    "target_type",
    "url_image",
    "file_image",
    "longitude",
    "latitude",
    "text_geolocation",
    "asset_file",
    "url_video",
];

/// Fields whose cell value is a filesystem path to be attached as binary content.
pub const FILE_FIELDS: &[&str] = &["file_image", "asset_file"];

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "tiff", "bmp", "svg"];
pub const MODEL_EXTENSIONS: &[&str] = &[
    "obj", "gltf", "glb", "fbx", "usdz", "stl", "blend", "dae", "sldprt", "sldasm", "step",
];

/// Maps a file extension to the hologram type it implies.
#[derive(Debug, Clone)]
pub struct ExtensionTable {
    entries: Vec<(HologramType, Vec<String>)>,
}

impl ExtensionTable {
    /// Build a table from `(type, extensions)` groups. Groups are expected to
    /// be disjoint; on overlap the first group listed wins.
    pub fn new(groups: &[(HologramType, &[&str])]) -> Self {
        let entries = groups
            .iter()
            .map(|(kind, exts)| (*kind, exts.iter().map(|e| e.to_string()).collect()))
            .collect();
        ExtensionTable { entries }
    }

    /// Classify an extension (without the leading dot). Matching is exact,
    /// so `GLB` does not match `glb`.
    pub fn classify(&self, extension: &str) -> Option<HologramType> {
        self.entries
            .iter()
            .find(|(_, exts)| exts.iter().any(|e| e == extension))
            .map(|(kind, _)| *kind)
    }
}

impl Default for ExtensionTable {
    fn default() -> Self {
        ExtensionTable::new(&[
            (HologramType::Video, VIDEO_EXTENSIONS),
            (HologramType::Image, IMAGE_EXTENSIONS),
            (HologramType::Model, MODEL_EXTENSIONS),
        ])
    }
}

/// Allow-list of header names plus the subset that refer to files.
#[derive(Debug, Clone)]
pub struct Catalog {
    known_fields: Vec<String>,
    file_fields: Vec<String>,
    pub extensions: ExtensionTable,
}

impl Catalog {
    pub fn new(known_fields: &[&str], file_fields: &[&str], extensions: ExtensionTable) -> Self {
        Catalog {
            known_fields: known_fields.iter().map(|s| s.to_string()).collect(),
            file_fields: file_fields.iter().map(|s| s.to_string()).collect(),
            extensions,
        }
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.known_fields.iter().any(|f| f == name)
    }

    pub fn is_file_field(&self, name: &str) -> bool {
        self.file_fields.iter().any(|f| f == name)
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::new(KNOWN_FIELDS, FILE_FIELDS, ExtensionTable::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_classifies_each_group() {
        let table = ExtensionTable::default();
        assert_eq!(table.classify("mov"), Some(HologramType::Video));
        assert_eq!(table.classify("svg"), Some(HologramType::Image));
        assert_eq!(table.classify("sldasm"), Some(HologramType::Model));
        assert_eq!(table.classify("pdf"), None);
    }

    #[test]
    fn classification_is_case_sensitive() {
        assert_eq!(ExtensionTable::default().classify("GLB"), None);
    }

    #[test]
    fn custom_table_replaces_defaults() {
        let table = ExtensionTable::new(&[(HologramType::Model, &["ply"])]);
        assert_eq!(table.classify("ply"), Some(HologramType::Model));
        assert_eq!(table.classify("glb"), None);
    }

    #[test]
    fn default_catalog_file_fields_are_known() {
        let catalog = Catalog::default();
        for f in FILE_FIELDS {
            assert!(catalog.is_known(f));
            assert!(catalog.is_file_field(f));
        }
        assert!(!catalog.is_file_field("url_image"));
        assert!(!catalog.is_known("foo_bar"));
    }
}
