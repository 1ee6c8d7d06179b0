//! The spatial predicate and measurement API.
//!
//! [`GeomRef`] pairs a subject with a connection. Functions every geometry
//! supports, including the bounding-box comparisons, are inherent methods.
//! Subtype-specific families live in [`PointFunctions`],
//! [`LineStringFunctions`] and [`PolygonFunctions`], which are implemented
//! only for subjects carrying the matching capability marker.
//!
//! Every method runs exactly one calculation, except where noted, and
//! surfaces database failures as [`SpatialError::Calculation`]. Nothing is
//! rescued: a function the database rejects for a subtype pairing fails.
//!
//! ```rust,ignore
//! use postgis_adapter::prelude::*;
//!
//! let distance = adapter.geom(&city).distance_to(&street)?;
//! let left = adapter.geom(&point).strictly_left_of(&city)?;
//! let length = adapter.geom(&street).length()?;
//! ```
//!
//! [`SpatialError::Calculation`]: crate::errors::SpatialError::Calculation

mod bbox;
mod common;
mod line_string;
mod point;
mod polygon;
pub mod record;
pub mod units;

pub use line_string::LineStringFunctions;
pub use point::PointFunctions;
pub use polygon::PolygonFunctions;
pub use record::RecordMut;
pub use units::{utm_srid, utm_zone_number, DistanceUnit};

use crate::config::SpatialConfig;
use crate::connection::SpatialConnection;
use crate::errors::SpatialResult;
use crate::executor::{CalcValue, SpatialExecutor};
use crate::geometry::Geometry;
use crate::sql::{Calculation, Operation, Parameter};
use crate::subject::{AsSubject, Subject};

/// Runs calculations on behalf of one subject. The function family traits
/// are written against this.
pub trait SpatialCalculation {
    fn config(&self) -> &SpatialConfig;

    /// This subject in calculation form.
    fn own_subject(&self) -> SpatialResult<Subject<'_>>;

    fn run(&self, calculation: &Calculation<'_>) -> SpatialResult<CalcValue>;

    fn run_text(&self, calculation: &Calculation<'_>) -> SpatialResult<Option<String>>;

    /// The subject's geometry if it is held in memory.
    fn loaded_geometry(&self) -> Option<&Geometry>;

    /// A calculation with this subject as its first argument.
    fn calculation(&self, operation: impl Into<Operation>) -> SpatialResult<Calculation<'_>> {
        Ok(Calculation::new(operation).subject(self.own_subject()?))
    }

    fn unary(&self, operation: impl Into<Operation>, parameters: Vec<Parameter>) -> SpatialResult<CalcValue> {
        let calculation = parameters
            .into_iter()
            .fold(self.calculation(operation)?, |calc, parameter| calc.parameter(parameter));
        self.run(&calculation)
    }

    fn binary<O: AsSubject + ?Sized>(
        &self,
        operation: impl Into<Operation>,
        other: &O,
        parameters: Vec<Parameter>,
    ) -> SpatialResult<CalcValue> {
        let calculation = parameters
            .into_iter()
            .fold(self.calculation(operation)?.with_subject(other)?, |calc, parameter| {
                calc.parameter(parameter)
            });
        self.run(&calculation)
    }
}

/// A geometry-bearing subject bound to a connection.
pub struct GeomRef<'a, C: ?Sized, S: ?Sized> {
    connection: &'a C,
    config: &'a SpatialConfig,
    subject: &'a S,
}

impl<C: ?Sized, S: ?Sized> Clone for GeomRef<'_, C, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C: ?Sized, S: ?Sized> Copy for GeomRef<'_, C, S> {}

impl<'a, C: SpatialConnection + ?Sized, S: AsSubject + ?Sized> GeomRef<'a, C, S> {
    pub fn new(connection: &'a C, config: &'a SpatialConfig, subject: &'a S) -> Self {
        GeomRef {
            connection,
            config,
            subject,
        }
    }

    pub fn subject(&self) -> &'a S {
        self.subject
    }

    pub fn connection(&self) -> &'a C {
        self.connection
    }

    pub fn executor(&self) -> SpatialExecutor<'a, C> {
        SpatialExecutor::new(self.connection, self.config)
    }

    /// Rebinds the same connection to another subject.
    pub fn with<T: AsSubject + ?Sized>(&self, subject: &'a T) -> GeomRef<'a, C, T> {
        GeomRef::new(self.connection, self.config, subject)
    }
}

impl<C: SpatialConnection + ?Sized, S: AsSubject + ?Sized> SpatialCalculation for GeomRef<'_, C, S> {
    fn config(&self) -> &SpatialConfig {
        self.config
    }

    fn own_subject(&self) -> SpatialResult<Subject<'_>> {
        self.subject.as_subject()
    }

    fn run(&self, calculation: &Calculation<'_>) -> SpatialResult<CalcValue> {
        self.executor().calculate(calculation)
    }

    fn run_text(&self, calculation: &Calculation<'_>) -> SpatialResult<Option<String>> {
        self.executor().calculate_text(calculation)
    }

    fn loaded_geometry(&self) -> Option<&Geometry> {
        self.subject.loaded_geometry()
    }
}
