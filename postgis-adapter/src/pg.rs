//! A [`SpatialConnection`] over the synchronous `postgres` client.

use std::sync::Arc;

use parking_lot::Mutex;
use postgres::{Client, NoTls, SimpleQueryMessage, SimpleQueryRow};

use crate::connection::{Row, SpatialConnection};
use crate::errors::{SpatialError, SpatialResult};

/// A PostgreSQL connection speaking the simple-query protocol, so every
/// value arrives in its text form.
pub struct PgConnection {
    client: Mutex<Client>,
}

impl PgConnection {
    /// Connects without TLS, e.g. to
    /// `postgresql://postgres@localhost/postgis_test`.
    pub fn connect(url: &str) -> SpatialResult<PgConnection> {
        let client = Client::connect(url, NoTls).map_err(|err| {
            log::error!("Could not connect to PostgreSQL: {}", err);
            SpatialError::Database(format!("could not connect: {}", err))
        })?;
        Ok(Self::from_client(client))
    }

    pub fn from_client(client: Client) -> PgConnection {
        PgConnection {
            client: Mutex::new(client),
        }
    }

    fn simple_query(&self, sql: &str) -> SpatialResult<Vec<SimpleQueryMessage>> {
        self.client.lock().simple_query(sql).map_err(|err| {
            let message = match err.as_db_error() {
                Some(db_error) => db_error.message().to_string(),
                None => err.to_string(),
            };
            log::error!("Statement failed: {}: {}", sql, message);
            SpatialError::Database(message)
        })
    }
}

fn to_row(row: &SimpleQueryRow, columns: &mut Option<Arc<[String]>>) -> Row {
    let names = columns
        .get_or_insert_with(|| row.columns().iter().map(|c| c.name().to_string()).collect())
        .clone();
    let values = (0..row.len()).map(|i| row.get(i).map(str::to_string)).collect();
    Row::new(names, values)
}

impl SpatialConnection for PgConnection {
    fn execute(&self, sql: &str) -> SpatialResult<u64> {
        let affected = self
            .simple_query(sql)?
            .iter()
            .map(|message| match message {
                SimpleQueryMessage::CommandComplete(count) => *count,
                _ => 0,
            })
            .sum();
        Ok(affected)
    }

    fn select_value(&self, sql: &str) -> SpatialResult<Option<String>> {
        for message in self.simple_query(sql)? {
            if let SimpleQueryMessage::Row(row) = message {
                let value = row.try_get(0).map_err(|err| {
                    log::error!("Query returned no columns: {}", sql);
                    SpatialError::Database(err.to_string())
                })?;
                return Ok(value.map(str::to_string));
            }
        }
        Ok(None)
    }

    fn select_rows(&self, sql: &str) -> SpatialResult<Vec<Row>> {
        let mut columns = None;
        let rows = self
            .simple_query(sql)?
            .iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::Row(row) => Some(to_row(row, &mut columns)),
                _ => None,
            })
            .collect();
        Ok(rows)
    }
}
