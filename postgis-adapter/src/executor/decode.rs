//! Decoding of raw calculation results.
//!
//! The database hands back one text value per calculation. Its shape is
//! recognised by [`classify`] and then decoded by the matching entry of an
//! ordered decoder table. The order is significant: a geometry hex string is
//! also a run of digits and letters, so structured and geometry shapes are
//! tried before numbers, and a hex-looking value that fails to decode falls
//! back to the number and text decoders that follow it.

use std::fmt::{self, Display};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::ewkb;
use crate::geometry::Geometry;

static DE9IM_MATRIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[012TF*]{9}$").expect("matrix pattern is valid"));

static HEX_GEOMETRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^0[01](?:[0-9A-Fa-f]{2}){4,}$").expect("hex pattern is valid"));

/// The recognised shapes of a raw result, in decoding priority order.
///
/// A DE-9IM matrix made only of digits, such as `212101212`, is classified
/// as `Numeric`. Callers that expect a matrix read the raw text instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultShape {
    Null,
    Boolean,
    Structured,
    HexGeometry,
    Numeric,
    Text,
}

/// A decoded calculation result.
#[derive(Debug, Clone, PartialEq)]
pub enum CalcValue {
    Null,
    Bool(bool),
    Number(f64),
    Geometry(Geometry),
    /// JSON documents and DE-9IM matrices, kept as text.
    Structured(String),
    Text(String),
}

type Decoder = fn(&str) -> Option<CalcValue>;

/// Decoders tried for each non-null shape, highest priority first. Each
/// shape starts at its own entry and falls through the rest on failure.
const DECODERS: &[(ResultShape, Decoder)] = &[
    (ResultShape::Boolean, decode_boolean),
    (ResultShape::Structured, decode_structured),
    (ResultShape::HexGeometry, decode_geometry),
    (ResultShape::Numeric, decode_number),
    (ResultShape::Text, decode_text),
];

/// Determines the shape of a raw value without decoding it.
pub fn classify(raw: Option<&str>) -> ResultShape {
    let Some(raw) = raw else {
        return ResultShape::Null;
    };

    if raw == "t" || raw == "f" {
        ResultShape::Boolean
    } else if is_structured(raw) {
        ResultShape::Structured
    } else if HEX_GEOMETRY.is_match(raw) && ewkb::is_hex_string(raw) {
        ResultShape::HexGeometry
    } else if raw.trim().parse::<f64>().is_ok() {
        ResultShape::Numeric
    } else {
        ResultShape::Text
    }
}

/// Decodes a raw value into a [`CalcValue`].
///
/// An all-digit DE-9IM matrix decodes as [`CalcValue::Number`]; see
/// [`ResultShape`].
pub fn decode(raw: Option<&str>) -> CalcValue {
    let shape = classify(raw);
    let Some(raw) = raw else {
        return CalcValue::Null;
    };

    let start = DECODERS
        .iter()
        .position(|(candidate, _)| *candidate == shape)
        .unwrap_or(DECODERS.len() - 1);

    DECODERS[start..]
        .iter()
        .find_map(|(_, decoder)| decoder(raw))
        .unwrap_or_else(|| CalcValue::Text(raw.to_string()))
}

fn is_structured(raw: &str) -> bool {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return serde_json::from_str::<serde_json::Value>(raw).is_ok();
    }
    DE9IM_MATRIX.is_match(raw) && raw.bytes().any(|b| !b.is_ascii_digit())
}

fn decode_boolean(raw: &str) -> Option<CalcValue> {
    match raw {
        "t" => Some(CalcValue::Bool(true)),
        "f" => Some(CalcValue::Bool(false)),
        _ => None,
    }
}

fn decode_structured(raw: &str) -> Option<CalcValue> {
    is_structured(raw).then(|| CalcValue::Structured(raw.to_string()))
}

fn decode_geometry(raw: &str) -> Option<CalcValue> {
    match ewkb::decode_hex(raw) {
        Ok(geometry) => Some(CalcValue::Geometry(geometry)),
        Err(err) => {
            log::debug!("Hex-looking result is not a geometry ({}), trying other decoders", err);
            None
        }
    }
}

fn decode_number(raw: &str) -> Option<CalcValue> {
    raw.trim().parse::<f64>().ok().map(CalcValue::Number)
}

fn decode_text(raw: &str) -> Option<CalcValue> {
    Some(CalcValue::Text(raw.to_string()))
}

impl CalcValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CalcValue::Null)
    }

    fn kind(&self) -> &'static str {
        match self {
            CalcValue::Null => "null",
            CalcValue::Bool(_) => "boolean",
            CalcValue::Number(_) => "number",
            CalcValue::Geometry(_) => "geometry",
            CalcValue::Structured(_) => "structured text",
            CalcValue::Text(_) => "text",
        }
    }

    fn mismatch(&self, expected: &str) -> SpatialError {
        log::error!("Expected a {} result, got {}", expected, self.kind());
        SpatialError::Decode(format!("expected a {} result, got {}", expected, self.kind()))
    }

    pub fn into_bool(self) -> SpatialResult<bool> {
        match self {
            CalcValue::Bool(value) => Ok(value),
            other => Err(other.mismatch("boolean")),
        }
    }

    pub fn into_f64(self) -> SpatialResult<f64> {
        match self {
            CalcValue::Number(value) => Ok(value),
            other => Err(other.mismatch("number")),
        }
    }

    /// A number, or `None` for a NULL result.
    pub fn into_opt_f64(self) -> SpatialResult<Option<f64>> {
        match self {
            CalcValue::Null => Ok(None),
            other => other.into_f64().map(Some),
        }
    }

    /// An integral number.
    pub fn into_i64(self) -> SpatialResult<i64> {
        let value = self.into_f64()?;
        if value.fract() != 0.0 || !value.is_finite() {
            return Err(SpatialError::Decode(format!(
                "expected an integer result, got {}",
                value
            )));
        }
        Ok(value as i64)
    }

    pub fn into_geometry(self) -> SpatialResult<Geometry> {
        match self {
            CalcValue::Geometry(geometry) => Ok(geometry),
            other => Err(other.mismatch("geometry")),
        }
    }

    /// A geometry, or `None` for a NULL result.
    pub fn into_opt_geometry(self) -> SpatialResult<Option<Geometry>> {
        match self {
            CalcValue::Null => Ok(None),
            other => other.into_geometry().map(Some),
        }
    }

    /// The textual form of any non-null, non-geometry result.
    pub fn into_text(self) -> SpatialResult<String> {
        match self {
            CalcValue::Structured(text) | CalcValue::Text(text) => Ok(text),
            CalcValue::Number(value) => Ok(value.to_string()),
            CalcValue::Bool(value) => Ok(if value { "t" } else { "f" }.to_string()),
            other => Err(other.mismatch("text")),
        }
    }
}

impl Display for CalcValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcValue::Null => f.write_str("NULL"),
            CalcValue::Bool(value) => write!(f, "{}", value),
            CalcValue::Number(value) => write!(f, "{}", value),
            CalcValue::Geometry(geometry) => write!(f, "{}", geometry),
            CalcValue::Structured(text) | CalcValue::Text(text) => f.write_str(text),
        }
    }
}
