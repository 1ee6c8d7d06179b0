//! Configuration for the spatial adapter.

use std::env;
use std::sync::Arc;

use crate::errors::{SpatialError, SpatialResult};
use crate::sql::{is_simple_identifier, Spheroid};

/// SRID assumed for geometry literals that carry none, WGS 84 by default.
pub const DEFAULT_SRID: i32 = 4326;
/// SRID written into DDL for columns declared without one.
pub const UNKNOWN_SRID: i32 = -1;
/// Prefix prepended to spatial function names.
pub const DEFAULT_FUNCTION_PREFIX: &str = "ST_";
/// Geometry column used when a model does not declare one.
pub const DEFAULT_GEOMETRY_COLUMN: &str = "geom";
/// Primary key column used when a model does not declare one.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

const ENV_FUNCTION_PREFIX: &str = "POSTGIS_FUNCTION_PREFIX";
const ENV_DEFAULT_SRID: &str = "POSTGIS_DEFAULT_SRID";
const ENV_LEGACY_NAMES: &str = "POSTGIS_LEGACY_NAMES";

/// Which generation of PostGIS function names to emit.
///
/// `Modern` uses the PostGIS 2+ names (`ST_3DLength`, `ST_DistanceSphere`,
/// `ST_LineLocatePoint`). `Legacy` reproduces the 1.x spellings, including the
/// handful of functions that were never prefixed (`length3d`,
/// `perimeter3d`, `length_spheroid`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FunctionNaming {
    #[default]
    Modern,
    Legacy,
}

/// Adapter configuration.
///
/// Cloning is cheap; all clones share the same immutable settings.
///
/// # Examples
///
/// ```rust,ignore
/// use postgis_adapter::config::{FunctionNaming, SpatialConfig};
///
/// let config = SpatialConfig::builder()
///     .default_srid(3857)
///     .naming(FunctionNaming::Legacy)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct SpatialConfig {
    inner: Arc<SpatialConfigInner>,
}

#[derive(Debug)]
struct SpatialConfigInner {
    function_prefix: String,
    naming: FunctionNaming,
    default_srid: i32,
    unknown_srid: i32,
    default_geometry_column: String,
    primary_key: String,
    spheroid: Spheroid,
    simplify_tolerance: f64,
    dwithin_margin: f64,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        SpatialConfig {
            inner: Arc::new(SpatialConfigInner {
                function_prefix: DEFAULT_FUNCTION_PREFIX.to_string(),
                naming: FunctionNaming::Modern,
                default_srid: DEFAULT_SRID,
                unknown_srid: UNKNOWN_SRID,
                default_geometry_column: DEFAULT_GEOMETRY_COLUMN.to_string(),
                primary_key: DEFAULT_PRIMARY_KEY.to_string(),
                spheroid: Spheroid::iers_2003(),
                simplify_tolerance: 0.1,
                dwithin_margin: 0.1,
            }),
        }
    }
}

impl SpatialConfig {
    /// Returns a builder seeded with the default settings.
    pub fn builder() -> SpatialConfigBuilder {
        SpatialConfigBuilder::default()
    }

    /// Builds a configuration from the defaults overridden by the
    /// `POSTGIS_FUNCTION_PREFIX`, `POSTGIS_DEFAULT_SRID` and
    /// `POSTGIS_LEGACY_NAMES` environment variables.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if a variable is set to an unusable value.
    pub fn from_env() -> SpatialResult<Self> {
        let mut builder = SpatialConfig::builder();

        if let Ok(prefix) = env::var(ENV_FUNCTION_PREFIX) {
            builder = builder.function_prefix(prefix);
        }

        if let Ok(srid) = env::var(ENV_DEFAULT_SRID) {
            let srid = srid.trim().parse::<i32>().map_err(|_| {
                log::error!("{} is not an integer: {}", ENV_DEFAULT_SRID, srid);
                SpatialError::InvalidParameter(format!(
                    "{} must be an integer, got '{}'",
                    ENV_DEFAULT_SRID, srid
                ))
            })?;
            builder = builder.default_srid(srid);
        }

        if let Ok(flag) = env::var(ENV_LEGACY_NAMES) {
            let legacy = matches!(flag.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on");
            if legacy {
                builder = builder.naming(FunctionNaming::Legacy);
            }
        }

        builder.build()
    }

    pub fn function_prefix(&self) -> &str {
        &self.inner.function_prefix
    }

    pub fn naming(&self) -> FunctionNaming {
        self.inner.naming
    }

    /// SRID applied to literal geometries that have none.
    pub fn default_srid(&self) -> i32 {
        self.inner.default_srid
    }

    /// SRID written into DDL for columns declared without one.
    pub fn unknown_srid(&self) -> i32 {
        self.inner.unknown_srid
    }

    pub fn default_geometry_column(&self) -> &str {
        &self.inner.default_geometry_column
    }

    pub fn primary_key(&self) -> &str {
        &self.inner.primary_key
    }

    /// Spheroid used by spheroidal measurements when none is given.
    pub fn spheroid(&self) -> &Spheroid {
        &self.inner.spheroid
    }

    pub fn simplify_tolerance(&self) -> f64 {
        self.inner.simplify_tolerance
    }

    pub fn dwithin_margin(&self) -> f64 {
        self.inner.dwithin_margin
    }
}

/// Builder for [`SpatialConfig`].
#[derive(Debug, Clone)]
pub struct SpatialConfigBuilder {
    function_prefix: String,
    naming: FunctionNaming,
    default_srid: i32,
    unknown_srid: i32,
    default_geometry_column: String,
    primary_key: String,
    spheroid: Spheroid,
    simplify_tolerance: f64,
    dwithin_margin: f64,
}

impl Default for SpatialConfigBuilder {
    fn default() -> Self {
        SpatialConfigBuilder {
            function_prefix: DEFAULT_FUNCTION_PREFIX.to_string(),
            naming: FunctionNaming::Modern,
            default_srid: DEFAULT_SRID,
            unknown_srid: UNKNOWN_SRID,
            default_geometry_column: DEFAULT_GEOMETRY_COLUMN.to_string(),
            primary_key: DEFAULT_PRIMARY_KEY.to_string(),
            spheroid: Spheroid::iers_2003(),
            simplify_tolerance: 0.1,
            dwithin_margin: 0.1,
        }
    }
}

impl SpatialConfigBuilder {
    /// Sets the function name prefix. An empty prefix is allowed.
    pub fn function_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.function_prefix = prefix.into();
        self
    }

    pub fn naming(mut self, naming: FunctionNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn default_srid(mut self, srid: i32) -> Self {
        self.default_srid = srid;
        self
    }

    pub fn unknown_srid(mut self, srid: i32) -> Self {
        self.unknown_srid = srid;
        self
    }

    pub fn default_geometry_column(mut self, column: impl Into<String>) -> Self {
        self.default_geometry_column = column.into();
        self
    }

    pub fn primary_key(mut self, column: impl Into<String>) -> Self {
        self.primary_key = column.into();
        self
    }

    pub fn spheroid(mut self, spheroid: Spheroid) -> Self {
        self.spheroid = spheroid;
        self
    }

    pub fn simplify_tolerance(mut self, tolerance: f64) -> Self {
        self.simplify_tolerance = tolerance;
        self
    }

    pub fn dwithin_margin(mut self, margin: f64) -> Self {
        self.dwithin_margin = margin;
        self
    }

    /// Validates the settings and freezes them into a [`SpatialConfig`].
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if the prefix or a column name is not a
    /// plain SQL identifier, or if a default tolerance is not a finite,
    /// non-negative number.
    pub fn build(self) -> SpatialResult<SpatialConfig> {
        if !self.function_prefix.is_empty() && !is_simple_identifier(&self.function_prefix) {
            log::error!("Rejected function prefix {:?}", self.function_prefix);
            return Err(SpatialError::InvalidParameter(format!(
                "function prefix '{}' is not a plain identifier",
                self.function_prefix
            )));
        }

        for (what, column) in [
            ("default geometry column", &self.default_geometry_column),
            ("primary key", &self.primary_key),
        ] {
            if !is_simple_identifier(column) {
                log::error!("Rejected {} {:?}", what, column);
                return Err(SpatialError::InvalidParameter(format!(
                    "{} '{}' is not a plain identifier",
                    what, column
                )));
            }
        }

        for (what, value) in [
            ("simplify tolerance", self.simplify_tolerance),
            ("dwithin margin", self.dwithin_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                log::error!("Rejected {} {}", what, value);
                return Err(SpatialError::InvalidParameter(format!(
                    "{} must be a finite, non-negative number, got {}",
                    what, value
                )));
            }
        }

        Ok(SpatialConfig {
            inner: Arc::new(SpatialConfigInner {
                function_prefix: self.function_prefix,
                naming: self.naming,
                default_srid: self.default_srid,
                unknown_srid: self.unknown_srid,
                default_geometry_column: self.default_geometry_column,
                primary_key: self.primary_key,
                spheroid: self.spheroid,
                simplify_tolerance: self.simplify_tolerance,
                dwithin_margin: self.dwithin_margin,
            }),
        })
    }
}
