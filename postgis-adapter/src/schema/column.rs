use serde::{Deserialize, Serialize};

use crate::config::UNKNOWN_SRID;

use super::GeometryType;

/// Everything known about one geometry column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialColumn {
    pub name: String,
    pub geometry_type: GeometryType,
    pub srid: i32,
    pub with_z: bool,
    pub with_m: bool,
    pub null: bool,
}

impl SpatialColumn {
    /// Builds a descriptor from a `geometry_columns` catalog entry.
    ///
    /// A coordinate dimension of 4 means Z and M. A dimension of 3 means M
    /// when the catalog type name ends in `M` (`POINTM`) and Z otherwise.
    pub fn from_catalog(name: &str, type_name: &str, coord_dimension: i32, srid: i32) -> Self {
        let type_name = type_name.trim().to_ascii_uppercase();
        let measured_name = coord_dimension == 3 && type_name.ends_with('M');

        let (with_z, with_m) = match coord_dimension {
            4 => (true, true),
            3 if measured_name => (false, true),
            3 => (true, false),
            _ => (false, false),
        };

        let base = type_name.strip_suffix('M').unwrap_or(&type_name);
        let geometry_type = base.parse::<GeometryType>().unwrap_or(GeometryType::Geometry);

        SpatialColumn {
            name: name.to_string(),
            geometry_type,
            srid,
            with_z,
            with_m,
            null: true,
        }
    }

    /// Descriptor used when a geometry column is missing from the catalog.
    pub fn generic(name: &str, null: bool) -> Self {
        SpatialColumn {
            name: name.to_string(),
            geometry_type: GeometryType::Geometry,
            srid: UNKNOWN_SRID,
            with_z: false,
            with_m: false,
            null,
        }
    }

    pub fn coordinate_dimension(&self) -> u8 {
        2 + self.with_z as u8 + self.with_m as u8
    }

    /// The type name written into DDL: `POINT`, or `POINTM` for
    /// measured columns without Z.
    pub fn ddl_type_name(&self) -> String {
        let mut name = self.geometry_type.sql_name().to_string();
        if self.with_m && !self.with_z {
            name.push('M');
        }
        name
    }
}

/// A table column as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub sql_type: String,
    pub default: Option<String>,
    pub null: bool,
    /// Present for geometry columns.
    pub spatial: Option<SpatialColumn>,
}

impl Column {
    pub fn is_spatial(&self) -> bool {
        self.spatial.is_some()
    }
}

/// Options for a geometry column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnOptions {
    pub srid: Option<i32>,
    pub with_z: bool,
    pub with_m: bool,
    pub null: bool,
}

impl Default for ColumnOptions {
    fn default() -> Self {
        ColumnOptions {
            srid: None,
            with_z: false,
            with_m: false,
            null: true,
        }
    }
}

impl ColumnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn srid(mut self, srid: i32) -> Self {
        self.srid = Some(srid);
        self
    }

    pub fn with_z(mut self) -> Self {
        self.with_z = true;
        self
    }

    pub fn with_m(mut self) -> Self {
        self.with_m = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.null = false;
        self
    }
}
