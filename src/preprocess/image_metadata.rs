use std::path::Path;

use exif::{In, Reader as ExifReader, Tag, Value};

use super::{Preprocessor, check_size, fields_to_text};
use crate::error::{FerretError, Result};
use crate::model::{MediaClass, ProducerKind, Segment};

const MAX_IMAGE_BYTES: u64 = 10 * 1024 * 1024;

/// EXIF/XMP key-value pairs, emitted as `key: value` lines. Metadata only.
/// GPS fields are converted to decimal-degree strings so downstream
/// validators can pattern-match on plain numbers rather than EXIF's
/// degrees/minutes/seconds rational encoding.
pub struct ImageMetadataPreprocessor;

const TAGS: &[(Tag, &str)] = &[
    (Tag::Make, "camera_make"),
    (Tag::Model, "camera_model"),
    (Tag::BodySerialNumber, "camera_serial"),
    (Tag::Artist, "artist"),
    (Tag::Copyright, "copyright"),
    (Tag::Software, "software"),
    (Tag::UserComment, "usercomment"),
];

impl Preprocessor for ImageMetadataPreprocessor {
    fn producer_name(&self) -> &'static str {
        "image_metadata"
    }

    fn supports(&self, media_class: MediaClass) -> bool {
        matches!(media_class, MediaClass::Image)
    }

    fn process(&self, path: &Path) -> Result<Vec<Segment>> {
        check_size(path, MAX_IMAGE_BYTES)?;

        let file = std::fs::File::open(path).map_err(|source| FerretError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut bufreader = std::io::BufReader::new(file);
        let exif = ExifReader::new()
            .read_from_container(&mut bufreader)
            .map_err(|e| FerretError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason: format!("no EXIF container found: {e}"),
            })?;

        let mut fields = Vec::new();
        for (tag, name) in TAGS {
            if let Some(field) = exif.get_field(*tag, In::PRIMARY) {
                let value = field.display_value().with_unit(&exif).to_string();
                if !value.trim().is_empty() {
                    fields.push((name.to_string(), value));
                }
            }
        }

        if let (Some(lat), Some(lat_ref)) = (
            exif.get_field(Tag::GPSLatitude, In::PRIMARY),
            exif.get_field(Tag::GPSLatitudeRef, In::PRIMARY),
        ) {
            if let Some(decimal) = dms_to_decimal(&lat.value, &lat_ref.display_value().to_string())
            {
                fields.push(("gpslatitude".to_string(), format!("{decimal:.6}")));
            }
        }
        if let (Some(lon), Some(lon_ref)) = (
            exif.get_field(Tag::GPSLongitude, In::PRIMARY),
            exif.get_field(Tag::GPSLongitudeRef, In::PRIMARY),
        ) {
            if let Some(decimal) = dms_to_decimal(&lon.value, &lon_ref.display_value().to_string())
            {
                fields.push(("gpslongitude".to_string(), format!("{decimal:.6}")));
            }
        }
        if let Some(alt) = exif.get_field(Tag::GPSAltitude, In::PRIMARY) {
            fields.push((
                "gpsaltitude".to_string(),
                alt.display_value().with_unit(&exif).to_string(),
            ));
        }

        if fields.is_empty() {
            return Err(FerretError::PreprocessFailed {
                path: path.to_path_buf(),
                reason: "EXIF container present but no recognized fields".to_string(),
            });
        }

        Ok(vec![Segment {
            producer_name: self.producer_name(),
            producer_kind: ProducerKind::Metadata,
            text: fields_to_text(&fields),
        }])
    }
}

fn dms_to_decimal(value: &Value, reference: &str) -> Option<f64> {
    let Value::Rational(rationals) = value else {
        return None;
    };
    if rationals.len() < 3 {
        return None;
    }
    let degrees = rationals[0].to_f64();
    let minutes = rationals[1].to_f64();
    let seconds = rationals[2].to_f64();
    let mut decimal = degrees + minutes / 60.0 + seconds / 3600.0;
    if reference.trim_matches('"').eq_ignore_ascii_case("S")
        || reference.trim_matches('"').eq_ignore_ascii_case("W")
    {
        decimal = -decimal;
    }
    Some(decimal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use exif::Rational;

    #[test]
    fn converts_dms_to_positive_decimal() {
        let value = Value::Rational(vec![
            Rational { num: 37, denom: 1 },
            Rational { num: 46, denom: 1 },
            Rational { num: 30, denom: 1 },
        ]);
        let decimal = dms_to_decimal(&value, "\"N\"").unwrap();
        assert!((decimal - 37.775).abs() < 0.001);
    }

    #[test]
    fn applies_negative_sign_for_south_and_west() {
        let value = Value::Rational(vec![
            Rational { num: 37, denom: 1 },
            Rational { num: 0, denom: 1 },
            Rational { num: 0, denom: 1 },
        ]);
        let decimal = dms_to_decimal(&value, "\"S\"").unwrap();
        assert!(decimal < 0.0);
    }
}
