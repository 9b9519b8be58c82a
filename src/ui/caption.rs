//! Caption composition for the modal.
//!
//! Only fields present in the metadata record are emitted, in a fixed order:
//! date, location, altitude, camera settings, copyright.

use std::fmt;

use crate::metadata::{CaptureDate, GpsPosition, Lens, MetadataRecord};

const FEET_PER_METER: f64 = 3.28084;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

#[derive(Debug, Clone, PartialEq)]
pub enum CaptionField {
    Date(String),
    Location { label: String, url: String },
    Altitude(String),
    Camera(String),
    Lens(String),
    Iso(String),
    Shutter(String),
    Aperture(String),
    Format(String),
    Exposure(String),
    Copyright(String),
}

impl CaptionField {
    pub fn text(&self) -> &str {
        match self {
            Self::Location { label, .. } => label,
            Self::Date(s)
            | Self::Altitude(s)
            | Self::Camera(s)
            | Self::Lens(s)
            | Self::Iso(s)
            | Self::Shutter(s)
            | Self::Aperture(s)
            | Self::Format(s)
            | Self::Exposure(s)
            | Self::Copyright(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Caption {
    pub title: Option<String>,
    pub fields: Vec<CaptionField>,
}

impl Caption {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.fields.is_empty()
    }
}

impl fmt::Display for Caption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(title) = &self.title {
            writeln!(f, "{title}")?;
        }
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|field| match field {
                CaptionField::Location { label, url } => format!("{label} <{url}>"),
                other => other.text().to_string(),
            })
            .collect();
        if !parts.is_empty() {
            write!(f, "{}", parts.join(" · "))?;
        }
        Ok(())
    }
}

pub fn compose_caption(title: Option<&str>, record: &MetadataRecord) -> Caption {
    let mut fields = Vec::new();

    if let Some(date) = &record.date {
        fields.push(CaptionField::Date(format_date(date)));
    }
    if let Some(gps) = &record.gps {
        if let Some(location) = location_field(gps) {
            fields.push(location);
        }
        if let Some(alt) = gps.alt {
            fields.push(CaptionField::Altitude(format_feet(alt)));
        }
    }
    if let Some(model) = &record.camera_model {
        fields.push(CaptionField::Camera(model.clone()));
    }
    if let Some(lens) = &record.lens {
        fields.push(CaptionField::Lens(match lens {
            Lens::FocalLength(mm) => format!("{}mm", trim_number(*mm)),
            Lens::Name(name) => name.clone(),
        }));
    }
    if let Some(iso) = record.iso {
        fields.push(CaptionField::Iso(format!("ISO {iso}")));
    }
    if let Some(shutter) = &record.shutter {
        let text = if shutter.ends_with('s') {
            shutter.clone()
        } else {
            format!("{shutter}s")
        };
        fields.push(CaptionField::Shutter(text));
    }
    if let Some(aperture) = &record.aperture {
        let text = if aperture.to_ascii_lowercase().starts_with("f/") {
            aperture.clone()
        } else {
            format!("f/{aperture}")
        };
        fields.push(CaptionField::Aperture(text));
    }
    if let Some(format) = &record.format {
        fields.push(CaptionField::Format(format.clone()));
    }
    if let Some(ev) = record.exposure_compensation {
        fields.push(CaptionField::Exposure(format_exposure(ev)));
    }
    if let Some(holder) = &record.copyright {
        let text = if holder.starts_with('©') {
            holder.clone()
        } else {
            format!("© {holder}")
        };
        fields.push(CaptionField::Copyright(text));
    }

    Caption {
        title: title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string),
        fields,
    }
}

pub fn format_date(date: &CaptureDate) -> String {
    let month = MONTHS[(date.month.clamp(1, 12) - 1) as usize];
    let mut out = format!("{month} {}, {}", date.day, date.year);
    if let (Some(hour), Some(minute)) = (date.hour, date.minute) {
        out.push_str(&format!(" {hour:02}:{minute:02}"));
    }
    out
}

fn location_field(gps: &GpsPosition) -> Option<CaptionField> {
    let (lat, lon) = gps.coordinates()?;
    let label = match (&gps.lat_dms, &gps.lon_dms) {
        (Some(lat_dms), Some(lon_dms)) => format!("{lat_dms}, {lon_dms}"),
        _ => format!("{lat:.5}, {lon:.5}"),
    };
    Some(CaptionField::Location {
        label,
        url: format!("https://www.google.com/maps?q={lat},{lon}"),
    })
}

/// Meters to a thousands-separated foot count, e.g. `4000.0` -> `"13,123 ft"`.
pub fn format_feet(meters: f64) -> String {
    let feet = (meters * FEET_PER_METER).round() as i64;
    format!("{} ft", group_thousands(feet))
}

fn group_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn trim_number(value: f64) -> String {
    let text = format!("{value:.1}");
    text.strip_suffix(".0").map(str::to_string).unwrap_or(text)
}

fn format_exposure(ev: f64) -> String {
    let magnitude = trim_number(ev.abs());
    if magnitude == "0" {
        "0 EV".to_string()
    } else if ev > 0.0 {
        format!("+{magnitude} EV")
    } else {
        format!("-{magnitude} EV")
    }
}
