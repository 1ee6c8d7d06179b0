use std::backtrace::Backtrace;
use std::env;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use parking_lot::{Mutex, MutexGuard};
use postgis_adapter::connection::SpatialConnection;
use postgis_adapter::errors::{SpatialError, SpatialResult};
use postgis_adapter::geometry::Geometry;
use postgis_adapter::pg::PgConnection;
use postgis_adapter::registry::SpatialModel;
use postgis_adapter::schema::{ColumnOptions, TableOptions};
use postgis_adapter::sql::{SpatialQuoting, SqlValue};
use postgis_adapter::SpatialAdapter;

use crate::models::{City, DiffName, Position, Street};

/// Connection string of the PostGIS database the tests run against.
pub const DATABASE_URL_VAR: &str = "POSTGIS_TEST_URL";

/// Scratch tables created by individual tests, dropped by [`cleanup`].
pub const SCRATCH_TABLES: &[&str] = &["zm_points"];

// All tests share one database and one set of tables.
static DATABASE: Mutex<()> = parking_lot::const_mutex(());

pub fn database_url() -> Option<String> {
    env::var(DATABASE_URL_VAR).ok().filter(|url| !url.trim().is_empty())
}

/// Runs a database test between its setup and teardown.
///
/// Database tests are `#[ignore]`d by default and run with
/// `cargo test -- --ignored`; they fail when `POSTGIS_TEST_URL` is unset.
/// They are serialized, since they share tables. Teardown runs whether or
/// not the test body succeeds.
pub fn run_test<T, B, A>(before: B, test: T, after: A)
where
    T: Fn(TestContext) -> SpatialResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    B: Fn() -> SpatialResult<TestContext> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
    A: Fn(TestContext) -> SpatialResult<()> + std::panic::UnwindSafe + std::panic::RefUnwindSafe,
{
    if database_url().is_none() {
        panic!("{} must point at a PostGIS database", DATABASE_URL_VAR);
    }
    let _guard: MutexGuard<'_, ()> = DATABASE.lock();
    let start_time = Instant::now();

    let ctx = match before() {
        Ok(ctx) => ctx,
        Err(e) => panic!("Before run failed: {:?}", e),
    };

    let teardown = ctx.clone();
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| test(ctx)));
    let after_result = after(teardown);

    let failure = match result {
        Ok(Ok(_)) => match after_result {
            Ok(_) => return,
            Err(e) => format!("After run failed: {:?}", e),
        },
        Ok(Err(e)) => format!("Test failed: {:?}", e),
        Err(panic_err) => {
            let err_msg = if let Some(s) = panic_err.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_err.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            format!("Panic: {}", err_msg)
        }
    };

    eprintln!("\n==================== TEST FAILED ====================");
    eprintln!("Failed after {:?}", start_time.elapsed());
    eprintln!("Error: {}", failure);
    let backtrace = Backtrace::capture().to_string();
    if !backtrace.is_empty() && !backtrace.contains("disabled") {
        eprintln!("\nBacktrace:\n{}", backtrace);
    }
    eprintln!("=====================================================\n");

    panic!("{}", failure);
}

#[derive(Clone)]
pub struct TestContext {
    adapter: SpatialAdapter<PgConnection>,
}

impl TestContext {
    pub fn new(adapter: SpatialAdapter<PgConnection>) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> SpatialAdapter<PgConnection> {
        self.adapter.clone()
    }
}

/// Connects, registers the test models and recreates their tables.
pub fn create_test_context() -> SpatialResult<TestContext> {
    let url = database_url().ok_or_else(|| {
        SpatialError::InvalidOperation(format!("{} is not set", DATABASE_URL_VAR))
    })?;
    let adapter = SpatialAdapter::new(PgConnection::connect(&url)?);
    adapter.connection().execute("CREATE EXTENSION IF NOT EXISTS postgis")?;
    // AddGeometryColumn rejects SRIDs missing from spatial_ref_sys.
    adapter.connection().execute(
        "INSERT INTO spatial_ref_sys (srid, auth_name, auth_srid, srtext, proj4text) \
         SELECT 123, 'test', 123, 'LOCAL_CS[\"test\"]', '' \
         WHERE NOT EXISTS (SELECT 1 FROM spatial_ref_sys WHERE srid = 123)",
    )?;

    adapter.register::<City>();
    adapter.register::<Position>();
    adapter.register::<Street>();
    adapter.register::<DiffName>();

    let schema = adapter.schema();
    let srid = ColumnOptions::new().srid(123);
    schema.create_table(City::table_name(), TableOptions::new().force(), |t| {
        t.string("data").polygon("geom", srid);
    })?;
    schema.create_table(Position::table_name(), TableOptions::new().force(), |t| {
        t.string("data").point("geom", srid);
    })?;
    schema.create_table(Street::table_name(), TableOptions::new().force(), |t| {
        t.string("data").line_string("geom", srid);
    })?;
    schema.create_table(DiffName::table_name(), TableOptions::new().force(), |t| {
        t.string("data").point("the_geom", srid);
    })?;

    Ok(TestContext::new(adapter))
}

/// Drops every table the tests may have created.
pub fn cleanup(ctx: TestContext) -> SpatialResult<()> {
    let adapter = ctx.adapter();
    let tables = [
        City::table_name(),
        Position::table_name(),
        Street::table_name(),
        DiffName::table_name(),
    ];
    for table in tables.iter().chain(SCRATCH_TABLES) {
        adapter
            .connection()
            .execute(&format!("DROP TABLE IF EXISTS {} CASCADE", table))?;
    }
    Ok(())
}

/// Inserts a row into `M`'s table and returns its generated id.
pub fn insert<M: SpatialModel>(ctx: &TestContext, data: &str, geometry: &Geometry) -> SpatialResult<i64> {
    let adapter = ctx.adapter();
    let connection = adapter.connection();
    let sql = format!(
        "INSERT INTO {} (data, {}) VALUES ({}, {}) RETURNING {}",
        M::table_name(),
        M::primary_geometry_column(),
        connection.quote_value(&SqlValue::from(data))?,
        connection.quote_value(&SqlValue::from(geometry))?,
        M::primary_key()
    );
    let id = connection
        .select_value(&sql)?
        .ok_or_else(|| SpatialError::Database(format!("no id returned by {}", sql)))?;
    id.trim()
        .parse::<i64>()
        .map_err(|err| SpatialError::Decode(format!("'{}' is not an id: {}", id, err)))
}

pub fn insert_city(ctx: &TestContext, data: &str, geometry: Geometry) -> SpatialResult<City> {
    let id = insert::<City>(ctx, data, &geometry)?;
    Ok(City {
        id: Some(id),
        data: Some(data.to_string()),
        geom: Some(geometry),
    })
}

pub fn insert_position(ctx: &TestContext, data: &str, geometry: Geometry) -> SpatialResult<Position> {
    let id = insert::<Position>(ctx, data, &geometry)?;
    Ok(Position {
        id: Some(id),
        data: Some(data.to_string()),
        geom: Some(geometry),
    })
}

pub fn insert_street(ctx: &TestContext, data: &str, geometry: Geometry) -> SpatialResult<Street> {
    let id = insert::<Street>(ctx, data, &geometry)?;
    Ok(Street {
        id: Some(id),
        data: Some(data.to_string()),
        geom: Some(geometry),
    })
}

pub fn point(x: f64, y: f64) -> Geometry {
    Geometry::point(x, y, 123)
}

/// Triangle with a triangular hole, area 724 and perimeter 161.892.
pub fn holed_triangle() -> SpatialResult<Geometry> {
    Geometry::polygon(
        vec![
            vec![[12.0, 45.0], [45.0, 41.0], [4.0, 1.0], [12.0, 45.0]],
            vec![[2.0, 5.0], [5.0, 1.0], [14.0, 1.0], [2.0, 5.0]],
        ],
        123,
    )
}

/// Axis-aligned square with its lower left corner at `(x, y)`.
pub fn square(x: f64, y: f64, size: f64) -> SpatialResult<Geometry> {
    Geometry::polygon(
        vec![vec![
            [x, y],
            [x + size, y],
            [x + size, y + size],
            [x, y + size],
            [x, y],
        ]],
        123,
    )
}

/// The line `(1 1, 5 5, 5 2)`, length 8.657.
pub fn bent_street() -> SpatialResult<Geometry> {
    Geometry::line_string(vec![[1.0, 1.0], [5.0, 5.0], [5.0, 2.0]], 123)
}

pub fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {} within {} of {}",
        actual,
        tolerance,
        expected
    );
}
