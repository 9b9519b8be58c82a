use serde_json::{Map, Value};
use tracing::trace;

use crate::error::MetadataLookupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: Option<u32>,
    pub minute: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpsPosition {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Meters above sea level.
    pub alt: Option<f64>,
    pub lat_dms: Option<String>,
    pub lon_dms: Option<String>,
}

impl GpsPosition {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lon?))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lens {
    /// Focal length in millimetres.
    FocalLength(f64),
    Name(String),
}

/// Side-band metadata for one image. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataRecord {
    pub date: Option<CaptureDate>,
    pub gps: Option<GpsPosition>,
    pub camera_model: Option<String>,
    pub lens: Option<Lens>,
    pub iso: Option<u32>,
    pub shutter: Option<String>,
    pub aperture: Option<String>,
    pub format: Option<String>,
    pub exposure_compensation: Option<f64>,
    pub copyright: Option<String>,
}

fn string_field(obj: &Map<String, Value>, name: &str) -> Option<String> {
    match obj.get(name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => {
            trace!(field = name, value = %other, "Ignoring non-string metadata field");
            None
        }
    }
}

fn number_field(obj: &Map<String, Value>, name: &str) -> Option<f64> {
    let value = match obj.get(name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

impl CaptureDate {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let part = |name: &str| obj.get(name).and_then(Value::as_i64);
        let year = i32::try_from(part("year")?).ok()?;
        let month = u32::try_from(part("month")?).ok().filter(|m| (1..=12).contains(m))?;
        let day = u32::try_from(part("day")?).ok().filter(|d| (1..=31).contains(d))?;
        let hour = part("hour")
            .and_then(|h| u32::try_from(h).ok())
            .filter(|h| *h < 24);
        let minute = part("minute")
            .and_then(|m| u32::try_from(m).ok())
            .filter(|m| *m < 60);
        Some(Self {
            year,
            month,
            day,
            hour,
            minute,
        })
    }
}

impl GpsPosition {
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let gps = Self {
            lat: number_field(obj, "lat").filter(|v| (-90.0..=90.0).contains(v)),
            lon: number_field(obj, "lon").filter(|v| (-180.0..=180.0).contains(v)),
            alt: number_field(obj, "alt"),
            lat_dms: string_field(obj, "latDMS"),
            lon_dms: string_field(obj, "lonDMS"),
        };
        if gps == Self::default() {
            None
        } else {
            Some(gps)
        }
    }
}

impl MetadataRecord {
    /// Parses one record from the metadata document.
    ///
    /// Fields with the wrong type are dropped individually; only a record that
    /// is not an object at all is an error.
    pub fn from_value(key: &str, value: &Value) -> Result<Self, MetadataLookupError> {
        let obj = value
            .as_object()
            .ok_or_else(|| MetadataLookupError::Malformed {
                key: key.to_string(),
                reason: "record is not an object".into(),
            })?;

        let lens = match obj.get("lens") {
            Some(Value::Number(n)) => n.as_f64().filter(|v| *v > 0.0).map(Lens::FocalLength),
            Some(Value::String(s)) if !s.trim().is_empty() => Some(Lens::Name(s.trim().to_string())),
            _ => None,
        };

        Ok(Self {
            date: obj.get("date").and_then(CaptureDate::from_value),
            gps: obj.get("gps").and_then(GpsPosition::from_value),
            camera_model: string_field(obj, "cameraModel"),
            lens,
            iso: number_field(obj, "iso")
                .filter(|v| *v > 0.0)
                .map(|v| v.round() as u32),
            shutter: string_field(obj, "shutter"),
            aperture: string_field(obj, "aperture"),
            format: string_field(obj, "format"),
            exposure_compensation: number_field(obj, "exposureCompensation"),
            copyright: string_field(obj, "copyright"),
        })
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
