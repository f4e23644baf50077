// Row validation and normalization. Two passes run in order on each
// payload: the target-type pass checks the anchor fields, the hologram pass
// resolves the hologram type (from `url_video` or the asset file extension)
// and rewrites the payload into the shape the upload API expects.
//
// Error codes are stable: scripts wrapping the uploader branch on them.

use crate::catalog::ExtensionTable;
use crate::row::{FieldValue, RowPayload};
use crate::types::{HologramType, ParseError, TargetType};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("[BODY ARGS ERROR] Missing target_type. Please check your csv file")]
    MissingTargetType,

    #[error("[TARGET TYPE ERROR] Invalid value for target_type: {0}")]
    InvalidTargetType(ParseError),

    #[error("[IMAGE TARGET ERROR] Either url_image or file_image must be specified")]
    ImageTargetMissing,

    #[error("[IMAGE TARGET ERROR] You cannot specify both url_image and file_image, specify only one of them")]
    ImageTargetConflict,

    #[error(
        "[GEOLOCATION TARGET ERROR] Either text_geolocation or coordinate info (longitude and latitude) \
         must be specified. Hint: did you specify both longitude and latitude?"
    )]
    GeolocationMissing,

    #[error("[GEOLOCATION TARGET ERROR] You cannot specify both text_geolocation and coordinate info (longitude and latitude)")]
    GeolocationConflict,

    #[error("[GEOLOCATION TARGET ERROR] Longitude and latitude must be numbers, got '{0}'")]
    InvalidCoordinate(String),

    #[error("[GEOLOCATION TARGET ERROR] '{present}' is set but '{missing}' is not; coordinates need both")]
    PartialCoordinates { present: &'static str, missing: &'static str },

    #[error("[HOLOGRAM ERROR] You cannot specify both asset_file and url_video, specify only one of them")]
    HologramConflict,

    #[error("[HOLOGRAM ERROR] Either asset_file or url_video must be specified")]
    HologramMissing,

    #[error("[FILE EXTENSION ERROR] asset_file '{0}' has no file extension")]
    MissingExtension(String),

    #[error("[FILE EXTENSION ERROR] File extension {0} is not supported")]
    UnsupportedExtension(String),
}

impl ValidationError {
    pub fn code(&self) -> i32 {
        match self {
            ValidationError::MissingTargetType => -10,
            ValidationError::InvalidTargetType(_) => -11,
            ValidationError::ImageTargetMissing => -20,
            ValidationError::ImageTargetConflict => -21,
            ValidationError::GeolocationMissing => -22,
            ValidationError::GeolocationConflict => -23,
            ValidationError::InvalidCoordinate(_) => -24,
            ValidationError::PartialCoordinates { .. } => -25,
            ValidationError::HologramConflict => -30,
            ValidationError::HologramMissing => -31,
            ValidationError::MissingExtension(_) => -40,
            ValidationError::UnsupportedExtension(_) => -41,
        }
    }
}

/// Runs both validation passes against a payload.
#[derive(Debug, Clone)]
pub struct Validator<'a> {
    extensions: &'a ExtensionTable,
    /// Reject a lone longitude or latitude instead of treating the pair as absent.
    strict_coordinates: bool,
}

impl<'a> Validator<'a> {
    pub fn new(extensions: &'a ExtensionTable) -> Self {
        Validator { extensions, strict_coordinates: false }
    }

    pub fn strict_coordinates(mut self, strict: bool) -> Self {
        self.strict_coordinates = strict;
        self
    }

    pub fn validate(&self, row: &mut RowPayload) -> Result<(TargetType, HologramType), ValidationError> {
        let target = self.check_target(row)?;
        let hologram = self.resolve_hologram(row)?;
        Ok((target, hologram))
    }

    /// Target-type pass. Stores `target_type` back as an integer.
    pub fn check_target(&self, row: &mut RowPayload) -> Result<TargetType, ValidationError> {
        let raw = row.text("target_type").ok_or(ValidationError::MissingTargetType)?;
        let target = TargetType::parse(raw).map_err(ValidationError::InvalidTargetType)?;
        row.set("target_type", FieldValue::Int(target.ordinal()));

        match target {
            TargetType::Image => {
                match (row.has_field("url_image"), row.has_attachment("file_image")) {
                    (false, false) => return Err(ValidationError::ImageTargetMissing),
                    (true, true) => return Err(ValidationError::ImageTargetConflict),
                    _ => {}
                }
            }
            TargetType::Geolocation => self.check_geolocation(row)?,
            TargetType::Brick => {}
        }
        Ok(target)
    }

    fn check_geolocation(&self, row: &mut RowPayload) -> Result<(), ValidationError> {
        let has_lon = row.has_field("longitude");
        let has_lat = row.has_field("latitude");
        let has_text = row.has_field("text_geolocation");
        let has_pair = has_lon && has_lat;

        if !has_pair && !has_text {
            if self.strict_coordinates && (has_lon || has_lat) {
                let (present, missing) =
                    if has_lon { ("longitude", "latitude") } else { ("latitude", "longitude") };
                return Err(ValidationError::PartialCoordinates { present, missing });
            }
            return Err(ValidationError::GeolocationMissing);
        }
        if has_pair && has_text {
            return Err(ValidationError::GeolocationConflict);
        }
        if has_pair {
            for name in ["longitude", "latitude"] {
                let value = coerce_float(row, name)?;
                row.set(name, FieldValue::Float(value));
            }
        }
        Ok(())
    }

    /// Hologram-type pass. Sets `hologram_type` and renames `asset_file` to
    /// the field the API expects for the resolved type.
    pub fn resolve_hologram(&self, row: &mut RowPayload) -> Result<HologramType, ValidationError> {
        let has_asset = row.has_attachment("asset_file");
        let has_url = row.has_field("url_video");

        let hologram = match (has_asset, has_url) {
            (true, true) => return Err(ValidationError::HologramConflict),
            (false, false) => return Err(ValidationError::HologramMissing),
            (false, true) => HologramType::Video,
            (true, false) => {
                let hologram = self.classify_asset(row)?;
                row.rename_attachment("asset_file", hologram.file_field());
                if hologram == HologramType::Model {
                    row.set("type", FieldValue::Text("upload".to_string()));
                }
                hologram
            }
        };

        row.set("hologram_type", FieldValue::Int(hologram.ordinal()));
        debug!(?hologram, "resolved hologram type");
        Ok(hologram)
    }

    fn classify_asset(&self, row: &RowPayload) -> Result<HologramType, ValidationError> {
        let asset = row.attachments.get("asset_file").ok_or(ValidationError::HologramMissing)?;
        let ext = match asset.extension() {
            Some(ext) if !ext.is_empty() => ext,
            _ => return Err(ValidationError::MissingExtension(asset.file_name.clone())),
        };
        self.extensions
            .classify(ext)
            .ok_or_else(|| ValidationError::UnsupportedExtension(ext.to_string()))
    }
}

fn coerce_float(row: &RowPayload, name: &str) -> Result<f64, ValidationError> {
    match row.fields.get(name) {
        Some(FieldValue::Float(x)) => Ok(*x),
        Some(FieldValue::Int(n)) => Ok(*n as f64),
        Some(FieldValue::Text(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .ok_or_else(|| ValidationError::InvalidCoordinate(s.clone())),
        None => Err(ValidationError::GeolocationMissing),
    }
}
