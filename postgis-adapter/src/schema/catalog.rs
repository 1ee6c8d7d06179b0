//! Catalog queries: spatial column metadata, columns, indexes and tables.

use std::collections::HashMap;

use itertools::Itertools;

use crate::connection::SpatialConnection;
use crate::errors::{SpatialError, SpatialResult};

use super::{Column, SpatialColumn};

/// Tables maintained by PostGIS itself, never reported as user tables.
pub const IGNORED_TABLES: &[&str] = &["spatial_ref_sys", "geometry_columns", "geography_columns"];

/// An index as reported by the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDefinition {
    pub table: String,
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
    /// `true` for GiST indexes.
    pub spatial: bool,
}

fn schema_error(what: &str, err: SpatialError) -> SpatialError {
    log::error!("Catalog query for {} failed: {}", what, err);
    SpatialError::Schema(format!("{}: {}", what, err.message()))
}

fn parse_int(value: Option<&str>, what: &str) -> SpatialResult<i32> {
    value
        .and_then(|v| v.trim().parse::<i32>().ok())
        .ok_or_else(|| SpatialError::Schema(format!("catalog returned no integer for {}", what)))
}

/// Spatial column descriptors of `table` keyed by column name, read from
/// `geometry_columns`.
pub fn spatial_info<C: SpatialConnection + ?Sized>(
    connection: &C,
    table: &str,
) -> SpatialResult<HashMap<String, SpatialColumn>> {
    let sql = format!(
        "SELECT f_geometry_column, coord_dimension, srid, type FROM geometry_columns WHERE f_table_name = {}",
        connection.quote_string(table)
    );
    log::debug!("Spatial catalog lookup: {}", sql);

    let rows = connection
        .select_rows(&sql)
        .map_err(|err| schema_error("geometry_columns", err))?;

    let mut columns = HashMap::with_capacity(rows.len());
    for row in rows {
        let Some(name) = row.get("f_geometry_column") else {
            continue;
        };
        let dimension = parse_int(row.get("coord_dimension"), "coord_dimension")?;
        let srid = parse_int(row.get("srid"), "srid")?;
        let type_name = row.get("type").unwrap_or("GEOMETRY");
        columns.insert(
            name.to_string(),
            SpatialColumn::from_catalog(name, type_name, dimension, srid),
        );
    }
    Ok(columns)
}

/// Columns of `table` in ordinal order, with geometry columns enriched from
/// the spatial catalog. Geometry columns missing from the catalog get a
/// generic descriptor.
pub fn columns<C: SpatialConnection + ?Sized>(connection: &C, table: &str) -> SpatialResult<Vec<Column>> {
    let sql = format!(
        "SELECT a.attname, format_type(a.atttypid, a.atttypmod) AS sql_type, \
         pg_get_expr(d.adbin, d.adrelid) AS column_default, a.attnotnull \
         FROM pg_attribute a LEFT JOIN pg_attrdef d ON a.attrelid = d.adrelid AND a.attnum = d.adnum \
         WHERE a.attrelid = {}::regclass AND a.attnum > 0 AND NOT a.attisdropped \
         ORDER BY a.attnum",
        connection.quote_string(table)
    );
    log::debug!("Column lookup: {}", sql);

    let rows = connection
        .select_rows(&sql)
        .map_err(|err| schema_error("columns", err))?;

    let has_geometry = rows
        .iter()
        .any(|row| row.get("sql_type").is_some_and(is_geometry_type));

    let spatial = if has_geometry {
        spatial_info(connection, table).unwrap_or_else(|err| {
            log::warn!("No spatial metadata for {}, using generic descriptors: {}", table, err);
            HashMap::new()
        })
    } else {
        HashMap::new()
    };

    let columns = rows
        .iter()
        .filter_map(|row| {
            let name = row.get("attname")?.to_string();
            let sql_type = row.get("sql_type").unwrap_or_default().to_string();
            let null = row.get("attnotnull") != Some("t");

            let spatial = is_geometry_type(&sql_type).then(|| match spatial.get(&name) {
                Some(descriptor) => SpatialColumn {
                    null,
                    ..descriptor.clone()
                },
                None => {
                    log::debug!("Geometry column {}.{} not in catalog", table, name);
                    SpatialColumn::generic(&name, null)
                }
            });

            Some(Column {
                default: row.get("column_default").map(str::to_string),
                name,
                sql_type,
                null,
                spatial,
            })
        })
        .collect();
    Ok(columns)
}

fn is_geometry_type(sql_type: &str) -> bool {
    sql_type.starts_with("geometry")
}

/// Non-primary indexes of `table`, one entry per index.
pub fn indexes<C: SpatialConnection + ?Sized>(
    connection: &C,
    table: &str,
) -> SpatialResult<Vec<IndexDefinition>> {
    let sql = format!(
        "SELECT i.relname AS index_name, d.indisunique, a.attname, am.amname \
         FROM pg_class t \
         JOIN pg_index d ON t.oid = d.indrelid \
         JOIN pg_class i ON d.indexrelid = i.oid \
         JOIN pg_am am ON i.relam = am.oid \
         JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(d.indkey) \
         WHERE t.relname = {} AND t.relkind = 'r' AND NOT d.indisprimary \
         AND pg_table_is_visible(t.oid) \
         ORDER BY i.relname",
        connection.quote_string(table)
    );
    log::debug!("Index lookup: {}", sql);

    let rows = connection
        .select_rows(&sql)
        .map_err(|err| schema_error("indexes", err))?;

    let mut indexes = Vec::new();
    let grouped = rows
        .iter()
        .chunk_by(|row| row.get("index_name").unwrap_or_default().to_string());

    for (name, group) in &grouped {
        let group: Vec<_> = group.collect();
        let first = group[0];
        indexes.push(IndexDefinition {
            table: table.to_string(),
            name,
            unique: first.get("indisunique") == Some("t"),
            spatial: first
                .get("amname")
                .is_some_and(|am| am.eq_ignore_ascii_case("gist")),
            columns: group
                .iter()
                .filter_map(|row| row.get("attname").map(str::to_string))
                .collect(),
        });
    }
    Ok(indexes)
}

/// User tables visible on the search path, excluding PostGIS's own.
pub fn tables<C: SpatialConnection + ?Sized>(connection: &C) -> SpatialResult<Vec<String>> {
    let sql = "SELECT tablename FROM pg_tables WHERE schemaname = ANY (current_schemas(false)) ORDER BY tablename";
    log::debug!("Table lookup: {}", sql);

    let rows = connection
        .select_rows(sql)
        .map_err(|err| schema_error("tables", err))?;

    Ok(rows
        .iter()
        .filter_map(|row| row.get("tablename"))
        .filter(|name| !IGNORED_TABLES.contains(name))
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::GeometryType;
    use crate::test_support::RecordingConnection;

    #[test]
    fn test_spatial_info() {
        let conn = RecordingConnection::new();
        conn.push_rows(
            &["f_geometry_column", "coord_dimension", "srid", "type"],
            vec![
                vec![Some("geom"), Some("2"), Some("123"), Some("POLYGON")],
                vec![Some("track"), Some("3"), Some("4326"), Some("LINESTRINGM")],
            ],
        );

        let info = spatial_info(&conn, "cities").unwrap();
        assert_eq!(info["geom"].geometry_type, GeometryType::Polygon);
        assert_eq!(info["geom"].srid, 123);
        assert_eq!(info["track"].geometry_type, GeometryType::LineString);
        assert!(info["track"].with_m);
        assert_eq!(
            conn.last_statement().unwrap(),
            "SELECT f_geometry_column, coord_dimension, srid, type FROM geometry_columns WHERE f_table_name = 'cities'"
        );
    }

    #[test]
    fn test_spatial_info_error_is_schema_error() {
        let conn = RecordingConnection::new();
        conn.push_rows_error(SpatialError::Database("permission denied".into()));
        let result = spatial_info(&conn, "cities");
        assert!(matches!(result, Err(SpatialError::Schema(_))));
    }

    #[test]
    fn test_columns_with_catalog_fallback() {
        let conn = RecordingConnection::new();
        conn.push_rows(
            &["attname", "sql_type", "column_default", "attnotnull"],
            vec![
                vec![Some("id"), Some("integer"), Some("nextval('cities_id_seq'::regclass)"), Some("t")],
                vec![Some("data"), Some("character varying(100)"), None, Some("f")],
                vec![Some("geom"), Some("geometry(Polygon,123)"), None, Some("t")],
                vec![Some("extra"), Some("geometry"), None, Some("f")],
            ],
        );
        conn.push_rows(
            &["f_geometry_column", "coord_dimension", "srid", "type"],
            vec![vec![Some("geom"), Some("2"), Some("123"), Some("POLYGON")]],
        );

        let columns = columns(&conn, "cities").unwrap();
        assert_eq!(columns.len(), 4);
        assert!(!columns[0].is_spatial());
        assert!(!columns[0].null);
        assert!(columns[1].null);

        let geom = columns[2].spatial.as_ref().unwrap();
        assert_eq!(geom.geometry_type, GeometryType::Polygon);
        assert_eq!(geom.srid, 123);
        assert!(!geom.null);

        let extra = columns[3].spatial.as_ref().unwrap();
        assert_eq!(extra, &SpatialColumn::generic("extra", true));
    }

    #[test]
    fn test_columns_survive_catalog_failure() {
        let conn = RecordingConnection::new();
        conn.push_rows(
            &["attname", "sql_type", "column_default", "attnotnull"],
            vec![vec![Some("geom"), Some("geometry"), None, Some("f")]],
        );
        conn.push_rows_error(SpatialError::Database("relation geometry_columns does not exist".into()));

        let columns = columns(&conn, "parks").unwrap();
        assert_eq!(columns[0].spatial, Some(SpatialColumn::generic("geom", true)));
    }

    #[test]
    fn test_indexes_grouped_by_name() {
        let conn = RecordingConnection::new();
        conn.push_rows(
            &["index_name", "indisunique", "attname", "amname"],
            vec![
                vec![Some("index_cities_on_data_and_value"), Some("t"), Some("data"), Some("btree")],
                vec![Some("index_cities_on_data_and_value"), Some("t"), Some("value"), Some("btree")],
                vec![Some("index_cities_on_geom"), Some("f"), Some("geom"), Some("gist")],
            ],
        );

        let indexes = indexes(&conn, "cities").unwrap();
        assert_eq!(indexes.len(), 2);
        assert_eq!(indexes[0].columns, vec!["data", "value"]);
        assert!(indexes[0].unique);
        assert!(!indexes[0].spatial);
        assert_eq!(indexes[1].name, "index_cities_on_geom");
        assert!(indexes[1].spatial);
    }

    #[test]
    fn test_tables_skip_postgis_tables() {
        let conn = RecordingConnection::new();
        conn.push_rows(
            &["tablename"],
            vec![
                vec![Some("cities")],
                vec![Some("geometry_columns")],
                vec![Some("spatial_ref_sys")],
                vec![Some("streets")],
            ],
        );
        assert_eq!(tables(&conn).unwrap(), vec!["cities", "streets"]);
    }
}
