//! A scripted in-memory connection for unit tests.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::connection::{Row, SpatialConnection};
use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::Geometry;
use crate::registry::{GeomColumnDecl, PolygonGeometry, SpatialModel};
use crate::row::FromSpatialRow;
use crate::schema::GeometryType;
use crate::subject::{model_subject, AsSubject, Subject};

/// Records every statement and answers from queued responses. With nothing
/// queued, queries return no value or no rows and statements affect one row.
#[derive(Default)]
pub(crate) struct RecordingConnection {
    values: Mutex<VecDeque<SpatialResult<Option<String>>>>,
    rows: Mutex<VecDeque<SpatialResult<Vec<Row>>>>,
    execute_errors: Mutex<VecDeque<SpatialError>>,
    statements: Mutex<Vec<String>>,
}

impl RecordingConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_value(&self, value: Option<&str>) {
        self.values.lock().push_back(Ok(value.map(str::to_string)));
    }

    pub(crate) fn push_error(&self, err: SpatialError) {
        self.values.lock().push_back(Err(err));
    }

    pub(crate) fn push_rows(&self, columns: &[&str], rows: Vec<Vec<Option<&str>>>) {
        let columns: Arc<[String]> = columns.iter().map(|c| c.to_string()).collect();
        let rows = rows
            .into_iter()
            .map(|values| {
                Row::new(
                    columns.clone(),
                    values.into_iter().map(|v| v.map(str::to_string)).collect(),
                )
            })
            .collect();
        self.rows.lock().push_back(Ok(rows));
    }

    pub(crate) fn push_rows_error(&self, err: SpatialError) {
        self.rows.lock().push_back(Err(err));
    }

    pub(crate) fn push_execute_error(&self, err: SpatialError) {
        self.execute_errors.lock().push_back(err);
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.statements.lock().clone()
    }

    pub(crate) fn last_statement(&self) -> Option<String> {
        self.statements.lock().last().cloned()
    }
}

impl SpatialConnection for RecordingConnection {
    fn execute(&self, sql: &str) -> SpatialResult<u64> {
        self.statements.lock().push(sql.to_string());
        match self.execute_errors.lock().pop_front() {
            Some(err) => Err(err),
            None => Ok(1),
        }
    }

    fn select_value(&self, sql: &str) -> SpatialResult<Option<String>> {
        self.statements.lock().push(sql.to_string());
        self.values.lock().pop_front().unwrap_or(Ok(None))
    }

    fn select_rows(&self, sql: &str) -> SpatialResult<Vec<Row>> {
        self.statements.lock().push(sql.to_string());
        self.rows.lock().pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }
}

/// A polygon model with a secondary point column.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Parcel {
    pub(crate) id: Option<i64>,
    pub(crate) name: String,
    pub(crate) geom: Option<Geometry>,
    pub(crate) entrance: Option<Geometry>,
}

impl Parcel {
    pub(crate) fn saved(id: i64, geom: Geometry) -> Self {
        Parcel {
            id: Some(id),
            name: format!("parcel {}", id),
            geom: Some(geom),
            entrance: None,
        }
    }

    pub(crate) fn unsaved(geom: Geometry) -> Self {
        Parcel {
            id: None,
            name: "new parcel".to_string(),
            geom: Some(geom),
            entrance: None,
        }
    }
}

impl SpatialModel for Parcel {
    fn table_name() -> &'static str {
        "parcels"
    }

    fn geometry_columns() -> &'static [GeomColumnDecl] {
        const COLUMNS: &[GeomColumnDecl] = &[
            GeomColumnDecl::new("geom", Some(GeometryType::Polygon), Some(4326)),
            GeomColumnDecl::new("entrance", Some(GeometryType::Point), Some(4326)),
        ];
        COLUMNS
    }

    fn record_id(&self) -> Option<i64> {
        self.id
    }

    fn geometry(&self, column: &str) -> Option<&Geometry> {
        match column {
            "geom" => self.geom.as_ref(),
            "entrance" => self.entrance.as_ref(),
            _ => None,
        }
    }

    fn set_geometry(&mut self, column: &str, geometry: Geometry) -> SpatialResult<()> {
        match column {
            "geom" => self.geom = Some(geometry),
            "entrance" => self.entrance = Some(geometry),
            _ => {
                return Err(SpatialError::InvalidOperation(format!(
                    "parcels has no geometry column '{}'",
                    column
                )))
            }
        }
        Ok(())
    }
}

impl AsSubject for Parcel {
    fn as_subject(&self) -> SpatialResult<Subject<'_>> {
        model_subject(self)
    }

    fn loaded_geometry(&self) -> Option<&Geometry> {
        self.primary_geometry()
    }
}

impl PolygonGeometry for Parcel {}

impl FromSpatialRow for Parcel {
    fn from_spatial_row(row: &Row) -> SpatialResult<Self> {
        Ok(Parcel {
            id: row.decode("id")?,
            name: row.decode("name")?,
            geom: row.decode("geom")?,
            entrance: row.decode("entrance")?,
        })
    }
}

/// A small square polygon in WGS 84.
pub(crate) fn square(size: f64) -> Geometry {
    Geometry::polygon(
        vec![vec![(0.0, 0.0), (size, 0.0), (size, size), (0.0, size), (0.0, 0.0)]],
        4326,
    )
    .unwrap()
}
