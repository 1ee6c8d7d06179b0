use std::sync::Arc;

use crate::config::SpatialConfig;
use crate::connection::SpatialConnection;
use crate::errors::SpatialResult;
use crate::executor::{CalcValue, SpatialExecutor};
use crate::finder::Finder;
use crate::functions::{GeomRef, RecordMut};
use crate::registry::{GeomRegistry, SpatialModel};
use crate::row::FromSpatialRow;
use crate::schema::{GeometryType, SchemaStatements};
use crate::sql::Calculation;
use crate::subject::AsSubject;

/// The entry point of the spatial API.
///
/// `SpatialAdapter` owns a connection, a [`SpatialConfig`] and the geometry
/// capability registry. It hands out short-lived views that borrow them:
/// [`GeomRef`] for predicates and measurements, [`RecordMut`] for in-place
/// geometry updates, [`Finder`] for class-level queries and
/// [`SchemaStatements`] for migrations.
///
/// Clones share the same connection and registry.
///
/// # Examples
///
/// ```rust,ignore
/// use postgis_adapter::prelude::*;
///
/// let adapter = SpatialAdapter::new(PgConnection::connect(&url)?);
/// adapter.register::<City>();
///
/// let city = adapter.finder::<City>().contain(&point)?;
/// let area = adapter.geom(&city).area()?;
/// ```
pub struct SpatialAdapter<C> {
    inner: Arc<AdapterInner<C>>,
}

struct AdapterInner<C> {
    connection: C,
    config: SpatialConfig,
    registry: GeomRegistry,
}

impl<C> Clone for SpatialAdapter<C> {
    fn clone(&self) -> Self {
        SpatialAdapter {
            inner: self.inner.clone(),
        }
    }
}

impl<C: SpatialConnection> SpatialAdapter<C> {
    /// An adapter with the default configuration.
    pub fn new(connection: C) -> Self {
        Self::with_config(connection, SpatialConfig::default())
    }

    pub fn with_config(connection: C, config: SpatialConfig) -> Self {
        SpatialAdapter {
            inner: Arc::new(AdapterInner {
                connection,
                config,
                registry: GeomRegistry::new(),
            }),
        }
    }

    pub fn connection(&self) -> &C {
        &self.inner.connection
    }

    pub fn config(&self) -> &SpatialConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &GeomRegistry {
        &self.inner.registry
    }

    pub fn executor(&self) -> SpatialExecutor<'_, C> {
        SpatialExecutor::new(&self.inner.connection, &self.inner.config)
    }

    /// Runs a hand-built calculation.
    pub fn calculate(&self, calculation: &Calculation<'_>) -> SpatialResult<CalcValue> {
        self.executor().calculate(calculation)
    }

    /// Schema statements that keep the registry's catalog cache current.
    pub fn schema(&self) -> SchemaStatements<'_, C> {
        SchemaStatements::new(&self.inner.connection, &self.inner.config).with_registry(&self.inner.registry)
    }

    /// The spatial API of `subject`: a model, a geometry literal or a
    /// [`ColumnRef`](crate::subject::ColumnRef).
    pub fn geom<'a, S: AsSubject + ?Sized>(&'a self, subject: &'a S) -> GeomRef<'a, C, S> {
        GeomRef::new(&self.inner.connection, &self.inner.config, subject)
    }

    pub fn record<'a, M: SpatialModel>(&'a self, model: &'a mut M) -> RecordMut<'a, C, M> {
        RecordMut::new(&self.inner.connection, &self.inner.config, model)
    }

    pub fn finder<M: SpatialModel + FromSpatialRow>(&self) -> Finder<'_, C, M> {
        Finder::new(&self.inner.connection, &self.inner.config)
    }

    /// Records the geometry columns declared by `M`.
    pub fn register<M: SpatialModel>(&self) {
        self.inner.registry.register::<M>();
    }

    /// The subtype of `table.column` as declared or catalogued.
    pub fn geometry_type(&self, table: &str, column: &str) -> GeometryType {
        self.inner
            .registry
            .geometry_type(&self.inner.connection, table, column)
    }
}
