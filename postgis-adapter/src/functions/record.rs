//! Calculations that replace a model's geometry.

use crate::config::SpatialConfig;
use crate::connection::SpatialConnection;
use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::Geometry;
use crate::registry::SpatialModel;
use crate::sql::identifier;
use crate::subject::ColumnRef;

use super::GeomRef;

/// A model borrowed mutably together with a connection.
///
/// Each operation computes the new geometry in the database, writes it back
/// with a separate `UPDATE` when the record is persisted, then stores it on
/// the model. A failed update leaves the model untouched.
pub struct RecordMut<'a, C: ?Sized, M> {
    connection: &'a C,
    config: &'a SpatialConfig,
    model: &'a mut M,
    column: &'a str,
}

impl<'a, C: SpatialConnection + ?Sized, M: SpatialModel> RecordMut<'a, C, M> {
    pub fn new(connection: &'a C, config: &'a SpatialConfig, model: &'a mut M) -> Self {
        RecordMut {
            connection,
            config,
            model,
            column: M::primary_geometry_column(),
        }
    }

    /// Operates on another geometry column of the model.
    pub fn on_column(mut self, column: &'a str) -> Self {
        self.column = column;
        self
    }

    pub fn column(&self) -> &str {
        self.column
    }

    pub fn model(&self) -> &M {
        &*self.model
    }

    /// Reprojects the geometry to `srid`.
    pub fn transform_in_place(&mut self, srid: i32) -> SpatialResult<&Geometry> {
        let geometry = {
            let subject = ColumnRef::new(&*self.model, self.column);
            GeomRef::new(self.connection, self.config, &subject).transform(srid)?
        };
        self.store("transform", geometry)
    }

    /// Simplifies the geometry. `None` uses the configured tolerance.
    pub fn simplify_in_place(&mut self, tolerance: impl Into<Option<f64>>) -> SpatialResult<&Geometry> {
        let geometry = {
            let subject = ColumnRef::new(&*self.model, self.column);
            GeomRef::new(self.connection, self.config, &subject).simplify(tolerance)?
        };
        self.store("simplify", geometry)
    }

    /// Reprojects the geometry to the UTM zone of its centroid.
    pub fn to_utm_in_place(&mut self) -> SpatialResult<&Geometry> {
        let geometry = {
            let subject = ColumnRef::new(&*self.model, self.column);
            GeomRef::new(self.connection, self.config, &subject).to_utm()?
        };
        self.store("to_utm", geometry)
    }

    fn store(&mut self, operation: &str, geometry: Geometry) -> SpatialResult<&Geometry> {
        if let Some(id) = self.model.record_id() {
            let sql = format!(
                "UPDATE {} SET {} = {} WHERE {} = {}",
                identifier(M::table_name()),
                identifier(self.column),
                geometry.sql_literal()?,
                identifier(M::primary_key()),
                id
            );
            log::debug!("Writing back {} result: {}", operation, sql);
            self.connection.execute(&sql).map_err(|err| {
                log::error!("Could not store {} result on {} {}: {}", operation, M::table_name(), id, err);
                SpatialError::calculation(operation, err.message())
            })?;
        }

        self.model.set_geometry(self.column, geometry)?;
        self.model.geometry(self.column).ok_or_else(|| {
            log::error!("{} did not keep the geometry set on column {}", M::table_name(), self.column);
            SpatialError::InvalidOperation(format!(
                "column '{}' of {} did not keep its geometry",
                self.column,
                M::table_name()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{square, Parcel, RecordingConnection};

    const POINT_1_1: &str = "0101000020E6100000000000000000F03F000000000000F03F";

    #[test]
    fn test_transform_persisted_record_updates_row() {
        let conn = RecordingConnection::new();
        conn.push_value(Some(POINT_1_1));
        let config = SpatialConfig::default();
        let mut parcel = Parcel::saved(5, square(2.0));

        let geometry = RecordMut::new(&conn, &config, &mut parcel)
            .transform_in_place(4326)
            .unwrap()
            .clone();
        assert_eq!(geometry.x(), Some(1.0));
        assert_eq!(parcel.geom, Some(geometry));
        assert_eq!(
            conn.statements(),
            vec![
                "SELECT ST_Transform(w1.geom, 4326) FROM parcels w1 WHERE w1.id = 5".to_string(),
                format!("UPDATE parcels SET geom = '{}'::geometry WHERE id = 5", POINT_1_1),
            ]
        );
    }

    #[test]
    fn test_simplify_unsaved_record_issues_no_update() {
        let conn = RecordingConnection::new();
        conn.push_value(Some(POINT_1_1));
        let config = SpatialConfig::default();
        let original = square(2.0);
        let mut parcel = Parcel::unsaved(original.clone());

        RecordMut::new(&conn, &config, &mut parcel)
            .simplify_in_place(None)
            .unwrap();
        let statements = conn.statements();
        assert_eq!(statements.len(), 1);
        assert_eq!(
            statements[0],
            format!("SELECT ST_Simplify({}, 0.1)", original.sql_literal().unwrap())
        );
        assert_eq!(parcel.geom.unwrap().x(), Some(1.0));
    }

    #[test]
    fn test_failed_update_keeps_model() {
        let conn = RecordingConnection::new();
        conn.push_value(Some(POINT_1_1));
        conn.push_execute_error(SpatialError::Database("permission denied".into()));
        let config = SpatialConfig::default();
        let original = square(2.0);
        let mut parcel = Parcel::saved(5, original.clone());

        let err = RecordMut::new(&conn, &config, &mut parcel)
            .simplify_in_place(0.5)
            .unwrap_err();
        assert!(matches!(&err, SpatialError::Calculation { operation, .. } if operation == "simplify"));
        assert_eq!(parcel.geom, Some(original));
    }

    #[test]
    fn test_secondary_column() {
        let conn = RecordingConnection::new();
        conn.push_value(Some(POINT_1_1));
        let config = SpatialConfig::default();
        let mut parcel = Parcel::saved(9, square(1.0));

        let mut record = RecordMut::new(&conn, &config, &mut parcel).on_column("entrance");
        assert_eq!(record.column(), "entrance");
        record.transform_in_place(4326).unwrap();

        assert_eq!(
            conn.statements()[0],
            "SELECT ST_Transform(w1.entrance, 4326) FROM parcels w1 WHERE w1.id = 9"
        );
        assert!(parcel.entrance.is_some());
    }

    #[test]
    fn test_calculation_failure_skips_update() {
        let conn = RecordingConnection::new();
        conn.push_error(SpatialError::Database("transform: couldn't project point".into()));
        let config = SpatialConfig::default();
        let mut parcel = Parcel::saved(5, square(2.0));

        let err = RecordMut::new(&conn, &config, &mut parcel)
            .transform_in_place(32633)
            .unwrap_err();
        assert!(err.is_calculation());
        assert_eq!(conn.statements().len(), 1);
    }
}
