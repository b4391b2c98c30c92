//! EXIF capture time and GPS extraction.
//!
//! The capture time is mandatory. GPS is best-effort: any missing or
//! malformed field drops the whole position rather than guessing.

use exif::{Exif, In, Rational, Reader, Tag, Value};
use std::io::Cursor;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::types::GeoLocation;

/// What the pipeline needs from an image's EXIF block.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureMetadata {
    /// Raw `DateTimeOriginal` text
    pub captured_at: String,
    pub location: Option<GeoLocation>,
}

/// Extracts capture metadata from EXIF.
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Extract capture metadata from the bytes of an image container.
    ///
    /// Fails only when there is no original capture time, which includes
    /// files with no EXIF block at all.
    pub fn extract(bytes: &[u8], path: &Path) -> PipelineResult<CaptureMetadata> {
        let exif = Self::read_exif(bytes);
        let captured_at = exif
            .as_ref()
            .and_then(Self::capture_time)
            .ok_or_else(|| PipelineError::MissingTimestamp(path.to_path_buf()))?;

        let location = exif.as_ref().and_then(Self::location);
        if location.is_none() {
            tracing::debug!("No usable GPS position in {:?}", path);
        }

        Ok(CaptureMetadata {
            captured_at,
            location,
        })
    }

    /// Parse the EXIF block out of a JPEG/TIFF/HEIF/PNG/WebP container.
    pub fn read_exif(bytes: &[u8]) -> Option<Exif> {
        Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .ok()
    }

    /// `DateTimeOriginal` as written by the camera.
    fn capture_time(exif: &Exif) -> Option<String> {
        exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)
            .and_then(|f| Self::ascii(&f.value))
    }

    /// GPS position, or `None` if any of the five fields is missing or malformed.
    pub fn location(exif: &Exif) -> Option<GeoLocation> {
        let latitude = Self::coordinate(exif, Tag::GPSLatitude, Tag::GPSLatitudeRef)?;
        let longitude = Self::coordinate(exif, Tag::GPSLongitude, Tag::GPSLongitudeRef)?;
        let elevation = match &exif.get_field(Tag::GPSAltitude, In::PRIMARY)?.value {
            Value::Rational(v) => v.first().and_then(rational_to_f64)?,
            _ => return None,
        };

        Some(GeoLocation {
            latitude,
            longitude,
            elevation,
        })
    }

    fn coordinate(exif: &Exif, coord_tag: Tag, ref_tag: Tag) -> Option<f64> {
        let coord = exif.get_field(coord_tag, In::PRIMARY)?;
        let reference = exif.get_field(ref_tag, In::PRIMARY)?;
        let hemisphere = Self::ascii(&reference.value)?;
        match &coord.value {
            Value::Rational(rationals) => degrees_minutes(rationals, &hemisphere),
            _ => None,
        }
    }

    /// First ASCII string of a field, without trailing NULs or padding.
    fn ascii(value: &Value) -> Option<String> {
        match value {
            Value::Ascii(parts) => parts.first().and_then(|bytes| {
                let text = String::from_utf8_lossy(bytes);
                let text = text.trim_end_matches('\0').trim();
                (!text.is_empty()).then(|| text.to_string())
            }),
            _ => None,
        }
    }
}

/// Convert EXIF degree/minute rationals to signed decimal degrees.
///
/// Seconds are ignored; cameras that fill them fold the fraction into the
/// minutes anyway. `S` and `W` hemispheres are negative.
pub fn degrees_minutes(rationals: &[Rational], hemisphere: &str) -> Option<f64> {
    let degrees = rational_to_f64(rationals.first()?)?;
    let minutes = rational_to_f64(rationals.get(1)?)?;
    let value = degrees + minutes / 60.0;

    let sign = match hemisphere.trim().chars().next()? {
        'S' | 's' | 'W' | 'w' => -1.0,
        _ => 1.0,
    };
    Some(sign * value)
}

fn rational_to_f64(r: &Rational) -> Option<f64> {
    (r.denom != 0).then(|| r.to_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{jpeg_with_exif, ExifSpec, GpsSpec};

    fn rationals(pairs: &[(u32, u32)]) -> Vec<Rational> {
        pairs
            .iter()
            .map(|&(num, denom)| Rational { num, denom })
            .collect()
    }

    #[test]
    fn test_degrees_minutes_north() {
        let lat = rationals(&[(51, 1), (3154, 100), (0, 1)]);
        let value = degrees_minutes(&lat, "N").unwrap();
        assert!((value - 51.525_666).abs() < 1e-5);
    }

    #[test]
    fn test_degrees_minutes_south_negates() {
        let lat = rationals(&[(51, 1), (3154, 100), (0, 1)]);
        let north = degrees_minutes(&lat, "N").unwrap();
        let south = degrees_minutes(&lat, "S").unwrap();
        assert_eq!(south, -north);
    }

    #[test]
    fn test_degrees_minutes_west_negates() {
        let lon = rationals(&[(0, 1), (755, 100), (0, 1)]);
        let value = degrees_minutes(&lon, "W").unwrap();
        assert!((value + 0.125_833).abs() < 1e-5);
    }

    #[test]
    fn test_degrees_minutes_ignores_seconds() {
        let with = rationals(&[(10, 1), (30, 1), (59, 1)]);
        let without = rationals(&[(10, 1), (30, 1)]);
        assert_eq!(
            degrees_minutes(&with, "E"),
            degrees_minutes(&without, "E")
        );
    }

    #[test]
    fn test_degrees_minutes_rejects_malformed() {
        assert_eq!(degrees_minutes(&rationals(&[(51, 1)]), "N"), None);
        assert_eq!(degrees_minutes(&rationals(&[(51, 0), (1, 1)]), "N"), None);
        assert_eq!(degrees_minutes(&rationals(&[(51, 1), (1, 1)]), ""), None);
    }

    #[test]
    fn test_extract_full_metadata() {
        let bytes = jpeg_with_exif(
            32,
            32,
            255,
            &ExifSpec {
                captured_at: Some("2023:06:01 10:15:00".into()),
                gps: Some(GpsSpec::new((51, 1), (3154, 100), "N", (0, 1), (755, 100), "W", (1234, 10))),
            },
        );

        let meta = MetadataExtractor::extract(&bytes, Path::new("a.jpg")).unwrap();
        assert_eq!(meta.captured_at, "2023:06:01 10:15:00");
        let loc = meta.location.unwrap();
        assert!((loc.latitude - 51.525_666).abs() < 1e-5);
        assert!(loc.longitude < 0.0);
        assert!((loc.elevation - 123.4).abs() < 1e-9);
    }

    #[test]
    fn test_extract_without_gps_is_not_an_error() {
        let bytes = jpeg_with_exif(
            16,
            16,
            0,
            &ExifSpec {
                captured_at: Some("2023:06:01 10:15:00".into()),
                gps: None,
            },
        );

        let meta = MetadataExtractor::extract(&bytes, Path::new("b.jpg")).unwrap();
        assert_eq!(meta.location, None);
    }

    #[test]
    fn test_extract_without_timestamp_fails() {
        let bytes = jpeg_with_exif(
            16,
            16,
            0,
            &ExifSpec {
                captured_at: None,
                gps: None,
            },
        );

        let err = MetadataExtractor::extract(&bytes, Path::new("c.jpg")).unwrap_err();
        assert!(matches!(err, PipelineError::MissingTimestamp(_)));
    }

    #[test]
    fn test_extract_from_non_image_fails_on_timestamp() {
        let err = MetadataExtractor::extract(b"not an image", Path::new("d.jpg")).unwrap_err();
        assert!(!err.is_recoverable());
    }
}
