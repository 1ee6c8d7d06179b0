use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::connection::quote_string;
use crate::errors::{SpatialError, SpatialResult};

/// A scalar argument appended after the geometry arguments of a spatial
/// function call.
///
/// Every variant renders to a literal that cannot break out of its argument
/// position: numbers must be finite, text is quoted with embedded quotes
/// doubled, and spheroids are validated before quoting.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    Float(f64),
    Integer(i64),
    Text(String),
    Spheroid(Spheroid),
    /// Several numbers passed as consecutive arguments, e.g. the
    /// `x, y, radius` of a legacy point-in-circle test.
    Floats(Vec<f64>),
}

impl Parameter {
    /// Renders the parameter as SQL argument text.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` for NaN or infinite numbers.
    pub fn render(&self) -> SpatialResult<String> {
        match self {
            Parameter::Float(value) => render_float(*value),
            Parameter::Integer(value) => Ok(value.to_string()),
            Parameter::Text(text) => Ok(quote_string(text)),
            Parameter::Spheroid(spheroid) => spheroid.to_sql_literal(),
            Parameter::Floats(values) => {
                let rendered = values
                    .iter()
                    .map(|v| render_float(*v))
                    .collect::<SpatialResult<Vec<_>>>()?;
                Ok(rendered.join(", "))
            }
        }
    }
}

pub(crate) fn render_float(value: f64) -> SpatialResult<String> {
    if !value.is_finite() {
        log::error!("Refusing to render non-finite number {}", value);
        return Err(SpatialError::InvalidParameter(format!(
            "numeric parameter must be finite, got {}",
            value
        )));
    }
    Ok(format!("{}", value))
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Float(value)
    }
}

impl From<i64> for Parameter {
    fn from(value: i64) -> Self {
        Parameter::Integer(value)
    }
}

impl From<i32> for Parameter {
    fn from(value: i32) -> Self {
        Parameter::Integer(value as i64)
    }
}

impl From<&str> for Parameter {
    fn from(value: &str) -> Self {
        Parameter::Text(value.to_string())
    }
}

impl From<String> for Parameter {
    fn from(value: String) -> Self {
        Parameter::Text(value)
    }
}

impl From<Spheroid> for Parameter {
    fn from(value: Spheroid) -> Self {
        Parameter::Spheroid(value)
    }
}

impl From<Vec<f64>> for Parameter {
    fn from(value: Vec<f64>) -> Self {
        Parameter::Floats(value)
    }
}

/// A reference ellipsoid for spheroidal measurements, rendered as
/// `'SPHEROID["NAME",semi_major_axis,inverse_flattening]'`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spheroid {
    name: String,
    semi_major_axis: f64,
    inverse_flattening: f64,
}

impl Spheroid {
    /// Creates a spheroid.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the name contains a double quote or the
    /// axis values are not finite and positive.
    pub fn new(
        name: impl Into<String>,
        semi_major_axis: f64,
        inverse_flattening: f64,
    ) -> SpatialResult<Spheroid> {
        let spheroid = Spheroid {
            name: name.into(),
            semi_major_axis,
            inverse_flattening,
        };
        spheroid.validate()?;
        Ok(spheroid)
    }

    /// The IERS 2003 ellipsoid, the default for spheroidal measurements.
    pub fn iers_2003() -> Spheroid {
        Spheroid {
            name: "IERS_2003".to_string(),
            semi_major_axis: 6378136.6,
            inverse_flattening: 298.25642,
        }
    }

    pub fn wgs_84() -> Spheroid {
        Spheroid {
            name: "WGS 84".to_string(),
            semi_major_axis: 6378137.0,
            inverse_flattening: 298.257223563,
        }
    }

    pub fn grs_80() -> Spheroid {
        Spheroid {
            name: "GRS_1980".to_string(),
            semi_major_axis: 6378137.0,
            inverse_flattening: 298.257222101,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn semi_major_axis(&self) -> f64 {
        self.semi_major_axis
    }

    pub fn inverse_flattening(&self) -> f64 {
        self.inverse_flattening
    }

    fn validate(&self) -> SpatialResult<()> {
        if self.name.is_empty() || self.name.contains('"') {
            log::error!("Invalid spheroid name {:?}", self.name);
            return Err(SpatialError::InvalidParameter(format!(
                "spheroid name '{}' must be non-empty and free of double quotes",
                self.name
            )));
        }
        for value in [self.semi_major_axis, self.inverse_flattening] {
            if !value.is_finite() || value <= 0.0 {
                log::error!("Invalid spheroid axis value {}", value);
                return Err(SpatialError::InvalidParameter(format!(
                    "spheroid values must be finite and positive, got {}",
                    value
                )));
            }
        }
        Ok(())
    }

    /// The quoted SQL literal passed to spheroidal functions.
    pub fn to_sql_literal(&self) -> SpatialResult<String> {
        self.validate()?;
        Ok(quote_string(&self.to_string()))
    }
}

impl Default for Spheroid {
    fn default() -> Self {
        Spheroid::iers_2003()
    }
}

impl Display for Spheroid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SPHEROID[\"{}\",{},{}]",
            self.name, self.semi_major_axis, self.inverse_flattening
        )
    }
}
