// Closed classification values used by the upload API. Both enums are
// parsed from raw CSV strings with an explicit `parse` and sent back to the
// API as their numeric ordinal.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("'{0}' is not an integer")]
    NotAnInteger(String),

    #[error("{0} is not a recognised value")]
    OutOfRange(i64),
}

/// The kind of anchor a hologram attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Image,
    Geolocation,
    Brick,
}

impl TargetType {
    /// Parse a raw cell value such as `"1"` (surrounding whitespace allowed).
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        let n: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ParseError::NotAnInteger(raw.to_string()))?;
        match n {
            0 => Ok(TargetType::Image),
            1 => Ok(TargetType::Geolocation),
            2 => Ok(TargetType::Brick),
            other => Err(ParseError::OutOfRange(other)),
        }
    }

    pub fn ordinal(self) -> i64 {
        match self {
            TargetType::Image => 0,
            TargetType::Geolocation => 1,
            TargetType::Brick => 2,
        }
    }
}

/// The kind of media rendered at a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HologramType {
    Video,
    Image,
    Model,
}

impl HologramType {
    pub fn ordinal(self) -> i64 {
        match self {
            HologramType::Video => 0,
            HologramType::Image => 1,
            HologramType::Model => 2,
        }
    }

    /// Multipart field name the API expects for an uploaded file of this type.
    pub fn file_field(self) -> &'static str {
        match self {
            HologramType::Video => "file_video",
            HologramType::Image => "file_image_hologram",
            HologramType::Model => "file_model",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_target_ordinals() {
        assert_eq!(TargetType::parse("0"), Ok(TargetType::Image));
        assert_eq!(TargetType::parse(" 1 "), Ok(TargetType::Geolocation));
        assert_eq!(TargetType::parse("2"), Ok(TargetType::Brick));
    }

    #[test]
    fn rejects_bad_target_values() {
        assert_eq!(TargetType::parse("3"), Err(ParseError::OutOfRange(3)));
        assert_eq!(TargetType::parse("-1"), Err(ParseError::OutOfRange(-1)));
        assert_eq!(
            TargetType::parse("image"),
            Err(ParseError::NotAnInteger("image".into()))
        );
        assert!(TargetType::parse("1.0").is_err());
    }

    #[test]
    fn hologram_file_fields() {
        assert_eq!(HologramType::Video.file_field(), "file_video");
        assert_eq!(HologramType::Image.file_field(), "file_image_hologram");
        assert_eq!(HologramType::Model.file_field(), "file_model");
        assert_eq!(HologramType::Model.ordinal(), 2);
    }
}
