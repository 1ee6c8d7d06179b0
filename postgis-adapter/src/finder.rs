//! Class-level finders.
//!
//! Finders order or filter a model's table by a spatial measurement and
//! return whole records instead of scalars. Each one renders a [`FindQuery`]
//! and reads the rows back through [`FromSpatialRow`].
//!
//! ```rust,ignore
//! use postgis_adapter::prelude::*;
//!
//! let nearest = adapter.finder::<City>().closest_to(&here)?;
//! let biggest = adapter.finder::<City>().by_area(SortOrder::Descending)?;
//! ```

use std::marker::PhantomData;

use crate::config::SpatialConfig;
use crate::connection::SpatialConnection;
use crate::errors::{SpatialError, SpatialResult};
use crate::geometry::BoundingBox;
use crate::registry::SpatialModel;
use crate::row::FromSpatialRow;
use crate::sort_order::SortOrder;
use crate::sql::parameter::render_float;
use crate::sql::{identifier, SpatialFunction, SqlBuilder};
use crate::subject::{AsSubject, Subject};

/// Margin of [`Finder::all_dwithin`] when none is given.
pub const DEFAULT_FINDER_MARGIN: f64 = 1.0;

/// A `SELECT *` over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct FindQuery {
    table: String,
    conditions: Vec<String>,
    order_by: Vec<(String, SortOrder)>,
    limit: Option<u64>,
    skip: Option<u64>,
}

impl FindQuery {
    pub fn new(table: impl Into<String>) -> FindQuery {
        FindQuery {
            table: table.into(),
            conditions: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            skip: None,
        }
    }

    /// Adds a condition. Conditions are joined with `AND`.
    pub fn condition(mut self, condition: impl Into<String>) -> FindQuery {
        self.conditions.push(condition.into());
        self
    }

    pub fn order_by(mut self, expression: impl Into<String>, order: SortOrder) -> FindQuery {
        self.order_by.push((expression.into(), order));
        self
    }

    pub fn limit(mut self, limit: u64) -> FindQuery {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: u64) -> FindQuery {
        self.skip = Some(skip);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", identifier(&self.table));
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .iter()
                .map(|(expression, order)| format!("{} {}", expression, order))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(" ORDER BY ");
            sql.push_str(&order);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(skip) = self.skip {
            sql.push_str(&format!(" OFFSET {}", skip));
        }
        sql
    }
}

/// Spatial finders over the table of `M`.
pub struct Finder<'a, C: ?Sized, M> {
    connection: &'a C,
    config: &'a SpatialConfig,
    column: &'a str,
    _model: PhantomData<fn() -> M>,
}

impl<'a, C, M> Finder<'a, C, M>
where
    C: SpatialConnection + ?Sized,
    M: SpatialModel + FromSpatialRow,
{
    pub fn new(connection: &'a C, config: &'a SpatialConfig) -> Self {
        Finder {
            connection,
            config,
            column: M::primary_geometry_column(),
            _model: PhantomData,
        }
    }

    /// Measures another geometry column of the table.
    pub fn on_column(mut self, column: &'a str) -> Self {
        self.column = column;
        self
    }

    pub fn query(&self) -> FindQuery {
        FindQuery::new(M::table_name())
    }

    // =========================================================================
    // Distance
    // =========================================================================

    /// The record nearest to `other`.
    pub fn closest_to<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<Option<M>> {
        let order = self.binary_expression(SpatialFunction::Distance, other, Vec::new())?;
        self.first(self.query().order_by(order, SortOrder::Ascending))
    }

    /// Up to `limit` records, nearest to `other` first.
    pub fn close_to<O: AsSubject + ?Sized>(&self, other: &O, limit: impl Into<Option<u64>>) -> SpatialResult<Vec<M>> {
        let order = self.binary_expression(SpatialFunction::Distance, other, Vec::new())?;
        let query = self.query().order_by(order, SortOrder::Ascending);
        match limit.into() {
            Some(limit) => self.find(query.limit(limit)),
            None => self.find(query),
        }
    }

    pub fn farthest_from<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<Option<M>> {
        let order = self.binary_expression(SpatialFunction::Distance, other, Vec::new())?;
        self.first(self.query().order_by(order, SortOrder::Descending))
    }

    /// Every record within `margin` SRID units of `other`. `None` uses a
    /// margin of 1.
    pub fn all_dwithin<O: AsSubject + ?Sized>(&self, other: &O, margin: impl Into<Option<f64>>) -> SpatialResult<Vec<M>> {
        let margin = render_float(margin.into().unwrap_or(DEFAULT_FINDER_MARGIN))?;
        let condition = self.binary_expression(SpatialFunction::DWithin, other, vec![margin])?;
        self.find(self.query().condition(condition))
    }

    // =========================================================================
    // Containment
    // =========================================================================

    /// Every record whose geometry contains `other`.
    pub fn contains<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<Vec<M>> {
        let condition = self.binary_expression(SpatialFunction::Contains, other, Vec::new())?;
        self.find(self.query().condition(condition))
    }

    /// The first record whose geometry contains `other`.
    pub fn contain<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<Option<M>> {
        let condition = self.binary_expression(SpatialFunction::Contains, other, Vec::new())?;
        self.first(self.query().condition(condition))
    }

    pub fn all_within<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<Vec<M>> {
        let condition = self.binary_expression(SpatialFunction::Within, other, Vec::new())?;
        self.find(self.query().condition(condition))
    }

    pub fn covered_by<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<Vec<M>> {
        let condition = self.binary_expression(SpatialFunction::CoveredBy, other, Vec::new())?;
        self.find(self.query().condition(condition))
    }

    /// Every record whose bounding box meets `bbox`, given in `srid`
    /// coordinates.
    pub fn in_envelope(&self, bbox: &BoundingBox, srid: i32) -> SpatialResult<Vec<M>> {
        if !bbox.is_finite() {
            log::error!("Envelope {:?} has non-finite bounds", bbox);
            return Err(SpatialError::InvalidParameter(format!(
                "envelope bounds must be finite, got {:?}",
                bbox
            )));
        }
        let envelope = format!(
            "{}({}, {}, {}, {}, {})",
            self.function(SpatialFunction::MakeEnvelope),
            render_float(bbox.min_x)?,
            render_float(bbox.min_y)?,
            render_float(bbox.max_x)?,
            render_float(bbox.max_y)?,
            srid
        );
        let condition = format!("{} && {}", identifier(self.column), envelope);
        self.find(self.query().condition(condition))
    }

    // =========================================================================
    // Measurement order
    // =========================================================================

    pub fn by_length(&self, order: SortOrder) -> SpatialResult<Vec<M>> {
        self.find(self.query().order_by(self.unary_expression(SpatialFunction::Length), order))
    }

    pub fn longest(&self) -> SpatialResult<Option<M>> {
        let order = self.unary_expression(SpatialFunction::Length);
        self.first(self.query().order_by(order, SortOrder::Descending))
    }

    pub fn by_area(&self, order: SortOrder) -> SpatialResult<Vec<M>> {
        self.find(self.query().order_by(self.unary_expression(SpatialFunction::Area), order))
    }

    pub fn by_perimeter(&self, order: SortOrder) -> SpatialResult<Vec<M>> {
        self.find(self.query().order_by(self.unary_expression(SpatialFunction::Perimeter), order))
    }

    /// Records ordered by their boundary geometry.
    pub fn by_boundaries(&self, order: SortOrder) -> SpatialResult<Vec<M>> {
        self.find(self.query().order_by(self.unary_expression(SpatialFunction::Boundary), order))
    }

    // =========================================================================
    // Execution
    // =========================================================================

    pub fn find(&self, query: FindQuery) -> SpatialResult<Vec<M>> {
        let sql = query.to_sql();
        log::debug!("Spatial finder: {}", sql);
        let rows = self.connection.select_rows(&sql).map_err(|err| {
            log::error!("Finder on {} failed: {}", M::table_name(), err);
            SpatialError::calculation("find", err.message())
        })?;
        rows.iter().map(M::from_spatial_row).collect()
    }

    pub fn first(&self, query: FindQuery) -> SpatialResult<Option<M>> {
        Ok(self.find(query.limit(1))?.into_iter().next())
    }

    fn function(&self, function: SpatialFunction) -> String {
        SqlBuilder::new(self.config).function_name(function)
    }

    fn unary_expression(&self, function: SpatialFunction) -> String {
        format!("{}({})", self.function(function), identifier(self.column))
    }

    fn binary_expression<O: AsSubject + ?Sized>(
        &self,
        function: SpatialFunction,
        other: &O,
        parameters: Vec<String>,
    ) -> SpatialResult<String> {
        let mut arguments = vec![identifier(self.column), self.other_expression(other)?];
        arguments.extend(parameters);
        Ok(format!("{}({})", self.function(function), arguments.join(", ")))
    }

    /// Literals are inlined, tagged with the default SRID if they have none.
    /// Stored records become a scalar subquery.
    fn other_expression<O: AsSubject + ?Sized>(&self, other: &O) -> SpatialResult<String> {
        match other.as_subject()? {
            Subject::Literal(geometry) if geometry.has_srid() => geometry.sql_literal(),
            Subject::Literal(geometry) => Ok(format!(
                "{}({}, {})",
                self.function(SpatialFunction::SetSrid),
                geometry.sql_literal()?,
                self.config.default_srid()
            )),
            Subject::Persisted(record) => Ok(format!(
                "(SELECT {} FROM {} WHERE {} = {})",
                identifier(&record.column),
                identifier(&record.table),
                identifier(&record.primary_key),
                record.id
            )),
        }
    }
}
