use crate::model::{PriceBar, StorageError};
use rusqlite::{Connection, Row, params};
use std::fs;
use std::path::Path;

const TABLE_NAME: &str = "prices_daily";

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens (or creates) the database file and runs the schema migrations.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        if let Some(parent) = Path::new(db_path).parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        Self::with_connection(conn)
    }

    /// In-memory database, used by tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS prices_daily (
                date TEXT NOT NULL,
                symbol TEXT NOT NULL,
                open REAL,
                high REAL,
                low REAL,
                close REAL,
                adj_close REAL,
                volume INTEGER,
                PRIMARY KEY (date, symbol)
            );

            CREATE INDEX IF NOT EXISTS idx_symbol_date
            ON prices_daily (symbol, date);
            ",
        )?;
        Ok(Self { conn })
    }

    /// Upserts bars as delete-matching-keys then insert, inside one
    /// transaction. Re-running with the same input leaves the table
    /// unchanged. Returns the number of rows written.
    pub fn upsert_bars(&mut self, bars: &[PriceBar]) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        {
            let mut delete = tx.prepare(&format!(
                "DELETE FROM {TABLE_NAME} WHERE date = ?1 AND symbol = ?2"
            ))?;
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {TABLE_NAME}
                 (date, symbol, open, high, low, close, adj_close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ))?;

            for bar in bars {
                delete.execute(params![bar.date, &bar.symbol])?;
                insert.execute(params![
                    bar.date,
                    &bar.symbol,
                    bar.open,
                    bar.high,
                    bar.low,
                    bar.close,
                    bar.adj_close,
                    bar.volume,
                ])?;
            }
        }
        tx.commit()?;
        Ok(bars.len())
    }

    /// Returns every bar ordered by (symbol, date), the order the analyzer
    /// consumes them in.
    pub fn load_all_bars(&self) -> Result<Vec<PriceBar>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT date, symbol, open, high, low, close, adj_close, volume
             FROM {TABLE_NAME} ORDER BY symbol, date"
        ))?;

        let rows = stmt.query_map([], Self::map_bar)?;
        let mut bars = Vec::new();
        for bar in rows {
            bars.push(bar?);
        }
        Ok(bars)
    }

    pub fn row_count(&self) -> Result<usize, StorageError> {
        let count: usize = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {TABLE_NAME}"),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Distinct symbols in alphabetical order.
    pub fn symbols(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT DISTINCT symbol FROM {TABLE_NAME} ORDER BY symbol ASC"
        ))?;

        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut symbols = Vec::new();
        for symbol in rows {
            symbols.push(symbol?);
        }
        Ok(symbols)
    }

    // SQLite stores a NaN REAL as NULL, so the price columns come back
    // nullable and map to NaN, mirroring what was written.
    fn map_bar(row: &Row) -> Result<PriceBar, rusqlite::Error> {
        Ok(PriceBar {
            date: row.get(0)?,
            symbol: row.get(1)?,
            open: row.get::<_, Option<f64>>(2)?.unwrap_or(f64::NAN),
            high: row.get::<_, Option<f64>>(3)?.unwrap_or(f64::NAN),
            low: row.get::<_, Option<f64>>(4)?.unwrap_or(f64::NAN),
            close: row.get::<_, Option<f64>>(5)?.unwrap_or(f64::NAN),
            adj_close: row.get::<_, Option<f64>>(6)?.unwrap_or(f64::NAN),
            volume: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(symbol: &str, day: u32, adj_close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            symbol: symbol.to_string(),
            open: adj_close - 1.0,
            high: adj_close + 1.0,
            low: adj_close - 2.0,
            close: adj_close,
            adj_close,
            volume: 1_000,
        }
    }

    #[test]
    fn loading_twice_is_idempotent() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let bars = vec![bar("AAPL", 1, 100.0), bar("AAPL", 2, 101.0), bar("MSFT", 1, 400.0)];

        storage.upsert_bars(&bars).unwrap();
        let first_pass = storage.load_all_bars().unwrap();

        storage.upsert_bars(&bars).unwrap();
        let second_pass = storage.load_all_bars().unwrap();

        assert_eq!(storage.row_count().unwrap(), 3);
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn reingestion_replaces_instead_of_duplicating() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.upsert_bars(&[bar("AAPL", 1, 100.0)]).unwrap();
        storage.upsert_bars(&[bar("AAPL", 1, 105.0)]).unwrap();

        let bars = storage.load_all_bars().unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].adj_close, 105.0);
    }

    #[test]
    fn bars_come_back_ordered_by_symbol_then_date() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let input = vec![bar("MSFT", 2, 401.0), bar("AAPL", 2, 101.0), bar("AAPL", 1, 100.0)];
        storage.upsert_bars(&input).unwrap();

        let bars = storage.load_all_bars().unwrap();
        let keys: Vec<(String, NaiveDate)> =
            bars.iter().map(|b| (b.symbol.clone(), b.date)).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
        assert_eq!(storage.symbols().unwrap(), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn null_price_columns_round_trip_as_nan() {
        // Yahoo can leave open/high/low null on a bar with a valid close.
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut partial = bar("AAPL", 1, 100.0);
        partial.open = f64::NAN;
        partial.high = f64::NAN;
        storage.upsert_bars(&[partial]).unwrap();

        let bars = storage.load_all_bars().unwrap();
        assert_eq!(bars.len(), 1);
        assert!(bars[0].open.is_nan());
        assert!(bars[0].high.is_nan());
        assert_eq!(bars[0].low, 98.0);
        assert_eq!(bars[0].adj_close, 100.0);
        assert_eq!(bars[0].volume, 1_000);
    }

    #[test]
    fn round_trip_preserves_every_written_bar() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let mut input = vec![bar("JPM", 5, 170.25), bar("JPM", 6, 171.5), bar("V", 5, 280.0)];
        storage.upsert_bars(&input).unwrap();

        input.sort_by(|a, b| (&a.symbol, a.date).cmp(&(&b.symbol, b.date)));
        assert_eq!(storage.load_all_bars().unwrap(), input);
    }
}
