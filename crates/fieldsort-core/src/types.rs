//! Core data types for the fieldsort pipeline.
//!
//! An [`ImageRecord`] is what the pipeline learns about one photograph; a
//! [`SpecimenGroup`] is a run of records attributed to one decoded code.

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// Rendering of a code that could not be decoded.
pub const UNKNOWN_CODE: &str = "unknown";

/// Rendering of a missing coordinate or timestamp in reports.
pub const NOT_AVAILABLE: &str = "NA";

/// The identifier read from a photographed code card.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Code {
    /// Exactly one code was decoded
    Known(String),
    /// No code, or more than one, was found
    Unknown,
}

impl Code {
    /// Whether this code opens a new specimen group.
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(text) => text,
            Self::Unknown => UNKNOWN_CODE,
        }
    }
}

impl From<Option<String>> for Code {
    fn from(decoded: Option<String>) -> Self {
        match decoded {
            // A card literally printed with the sentinel can't be told apart downstream.
            Some(text) if text != UNKNOWN_CODE => Self::Known(text),
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Code {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Decimal GPS position from EXIF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoLocation {
    /// Decimal degrees, negative south of the equator
    pub latitude: f64,
    /// Decimal degrees, negative west of Greenwich
    pub longitude: f64,
    /// Metres
    pub elevation: f64,
}

/// Everything the pipeline knows about one photograph. Never mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageRecord {
    /// Source path as given (or discovered)
    pub path: PathBuf,

    /// Decoded code card, if any
    pub code: Code,

    /// Raw EXIF `DateTimeOriginal` ("YYYY:MM:DD HH:MM:SS")
    pub captured_at: String,

    /// GPS position, if the camera recorded one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
}

impl ImageRecord {
    /// Natural ordering: path first, then code and capture time.
    ///
    /// Grouping depends on this order, not on the order workers finish in.
    pub fn cmp_natural(&self, other: &Self) -> Ordering {
        self.path
            .cmp(&other.path)
            .then_with(|| self.code.cmp(&other.code))
            .then_with(|| self.captured_at.cmp(&other.captured_at))
    }

    /// File name without its extension.
    pub fn stem(&self) -> &str {
        self.path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    /// Extension without the leading dot (empty if there is none).
    pub fn extension(&self) -> &str {
        self.path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Location and time a group is reported under, taken from its coded record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Representative {
    pub captured_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoLocation>,
}

impl From<&ImageRecord> for Representative {
    fn from(record: &ImageRecord) -> Self {
        Self {
            captured_at: record.captured_at.clone(),
            location: record.location,
        }
    }
}

/// A run of consecutive records attributed to one code.
///
/// For a coded group the first member is the only code-bearing record. The
/// leading group of photos taken before any code card has `Code::Unknown`
/// and no representative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecimenGroup {
    pub code: Code,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub representative: Option<Representative>,
    pub members: Vec<ImageRecord>,
}

impl SpecimenGroup {
    /// Open a group on a coded record.
    pub fn open(record: ImageRecord) -> Self {
        Self {
            code: record.code.clone(),
            representative: Some(Representative::from(&record)),
            members: vec![record],
        }
    }

    /// The implicit group for photos that precede every code card.
    pub fn leading() -> Self {
        Self {
            code: Code::Unknown,
            representative: None,
            members: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn location(&self) -> Option<GeoLocation> {
        self.representative.as_ref().and_then(|r| r.location)
    }

    pub fn captured_at(&self) -> Option<&str> {
        self.representative.as_ref().map(|r| r.captured_at.as_str())
    }
}
