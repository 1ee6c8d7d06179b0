//! Runs spatial calculations and decodes their results.

pub mod decode;

pub use decode::{classify, decode, CalcValue, ResultShape};

use crate::config::SpatialConfig;
use crate::connection::SpatialConnection;
use crate::errors::{SpatialError, SpatialResult};
use crate::sql::{Calculation, SqlBuilder};

/// Executes [`Calculation`]s over a connection.
///
/// Every database failure during execution surfaces as
/// [`SpatialError::Calculation`] carrying the operation and the original
/// message. Failures while building the statement keep their own kind and
/// never reach the database.
pub struct SpatialExecutor<'a, C: ?Sized> {
    connection: &'a C,
    config: &'a SpatialConfig,
}

impl<'a, C: SpatialConnection + ?Sized> SpatialExecutor<'a, C> {
    pub fn new(connection: &'a C, config: &'a SpatialConfig) -> Self {
        SpatialExecutor { connection, config }
    }

    pub fn builder(&self) -> SqlBuilder<'a> {
        SqlBuilder::new(self.config)
    }

    /// Runs the calculation and decodes its single result value.
    pub fn calculate(&self, calculation: &Calculation<'_>) -> SpatialResult<CalcValue> {
        let raw = self.calculate_text(calculation)?;
        let value = decode(raw.as_deref());
        log::trace!("Calculation {} decoded to {:?}", calculation.operation(), value);
        Ok(value)
    }

    /// Runs the calculation and returns the raw result text.
    ///
    /// Used where the decoded shape would be ambiguous, such as DE-9IM
    /// matrices made only of digits.
    pub fn calculate_text(&self, calculation: &Calculation<'_>) -> SpatialResult<Option<String>> {
        let sql = self.builder().build(calculation)?;
        log::debug!("Spatial calculation: {}", sql);

        self.connection.select_value(&sql).map_err(|err| {
            let operation = calculation.operation().label();
            log::error!("Spatial calculation {} failed: {}", operation, err);
            match err {
                SpatialError::Calculation { message, .. } => {
                    SpatialError::calculation(operation, message)
                }
                other => SpatialError::calculation(operation, other.message()),
            }
        })
    }
}
