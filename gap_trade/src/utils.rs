//! Utility functions and helpers
//!
//! Parameter validation shared by the strategy components, CSV loaders for
//! the inputs a host would otherwise provide, and synthetic bar generation
//! for tests and demos.

use crate::history::History;
use crate::liquidation::Holdings;
use crate::universe::{CoarseFundamental, FineFundamental};
use crate::{DailyOhlcv, OhlcvData, Result, Symbol, TradeError};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Basic validation for window and count parameters
pub fn validate_period(period: usize, min_value: usize) -> std::result::Result<(), String> {
    if period < min_value {
        return Err(format!("Period must be at least {}", min_value));
    }
    Ok(())
}

/// Validate a floating-point parameter is positive
pub fn validate_positive(value: f64, name: &str) -> std::result::Result<(), String> {
    if value <= 0.0 {
        return Err(format!("{} must be positive", name));
    }
    Ok(())
}

/// Validate a value is within a range
pub fn validate_range(
    value: f64,
    min: f64,
    max: f64,
    name: &str,
) -> std::result::Result<(), String> {
    if value < min || value > max {
        return Err(format!("{} must be between {} and {}", name, min, max));
    }
    Ok(())
}

/// One row of a daily history CSV
#[derive(Debug, Deserialize)]
struct DailyRow {
    symbol: Symbol,
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
}

#[derive(Debug, Deserialize)]
struct HoldingRow {
    symbol: Symbol,
    quantity: f64,
}

fn read_rows<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<Vec<T>> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        TradeError::DataLoad(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let mut rows = Vec::new();
    for (i, record) in reader.deserialize().enumerate() {
        let row: T = record.map_err(|e| {
            TradeError::DataLoad(format!("Invalid record at line {}: {}", i + 2, e))
        })?;
        rows.push(row);
    }

    debug!(path = %path.display(), rows = rows.len(), "loaded csv");
    Ok(rows)
}

/// Load daily bars from a CSV file
///
/// Expected header: `symbol,date,open,high,low,close,volume` with ISO dates.
/// Rows may appear in any order; each symbol's bars end up sorted by date.
pub fn load_daily_history<P: AsRef<Path>>(path: P) -> Result<History> {
    let rows: Vec<DailyRow> = read_rows(path)?;
    if rows.is_empty() {
        return Err(TradeError::DataLoad("No data found in file".to_string()));
    }

    let mut history = History::new();
    for row in rows {
        let prices = [row.open, row.high, row.low, row.close];
        if !prices.iter().all(|p| *p > 0.0) {
            return Err(TradeError::InvalidData(format!(
                "non-positive price for {} on {}",
                row.symbol, row.date
            )));
        }
        history.push_bar(
            row.symbol,
            DailyOhlcv {
                date: row.date,
                data: OhlcvData {
                    open: row.open,
                    high: row.high,
                    low: row.low,
                    close: row.close,
                    volume: row.volume,
                },
            },
        );
    }

    Ok(history)
}

/// Load coarse fundamentals: `symbol,dollar_volume,price,has_fundamental_data`
pub fn load_coarse<P: AsRef<Path>>(path: P) -> Result<Vec<CoarseFundamental>> {
    read_rows(path)
}

/// Load fine fundamentals: `symbol,ev_to_ebitda`
pub fn load_fine<P: AsRef<Path>>(path: P) -> Result<Vec<FineFundamental>> {
    read_rows(path)
}

/// Load current positions: `symbol,quantity` (negative for shorts)
pub fn load_holdings<P: AsRef<Path>>(path: P) -> Result<Holdings> {
    let rows: Vec<HoldingRow> = read_rows(path)?;
    Ok(rows.into_iter().map(|r| (r.symbol, r.quantity)).collect())
}

/// Generate random daily OHLCV data for testing purposes
///
/// # Arguments
/// * `num_points` - Number of bars to generate
/// * `starting_price` - Open of the first bar
/// * `volatility` - Price volatility factor (0.0-1.0)
pub fn generate_test_data(
    num_points: usize,
    starting_price: f64,
    volatility: f64,
) -> Vec<DailyOhlcv> {
    random_walk(&mut rand::rng(), num_points, starting_price, volatility)
}

/// Same as [`generate_test_data`] but reproducible from `seed`
pub fn generate_seeded_data(
    num_points: usize,
    starting_price: f64,
    volatility: f64,
    seed: u64,
) -> Vec<DailyOhlcv> {
    let mut rng = StdRng::seed_from_u64(seed);
    random_walk(&mut rng, num_points, starting_price, volatility)
}

fn random_walk<R: Rng>(
    rng: &mut R,
    num_points: usize,
    starting_price: f64,
    volatility: f64,
) -> Vec<DailyOhlcv> {
    let mut data = Vec::with_capacity(num_points);
    let mut current_price = starting_price;

    for i in 0..num_points {
        let open = current_price;
        // Keep the walk strictly positive so log returns stay defined
        let close = (open + open * volatility * (rng.random::<f64>() - 0.5)).max(open * 0.01);

        let body_low = open.min(close);
        let high = open.max(close) + rng.random::<f64>() * volatility * open * 0.5;
        let low = (body_low - rng.random::<f64>() * volatility * open * 0.5).max(body_low * 0.5);
        let volume = rng.random_range(1000..10000);

        data.push(DailyOhlcv {
            date: data_generation::bar_date(i),
            data: OhlcvData {
                open,
                high,
                low,
                close,
                volume,
            },
        });

        current_price = close;
    }

    data
}

pub mod data_generation {
    use crate::{DailyOhlcv, OhlcvData};
    use chrono::{Days, NaiveDate};

    /// Calendar date of the `index`-th generated bar, starting 2023-01-02
    pub fn bar_date(index: usize) -> NaiveDate {
        let base = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap_or_default();
        let offset = Days::new(index as u64);
        base.checked_add_days(offset).unwrap_or(base)
    }

    /// Deterministic bars whose close compounds by `trend` every day
    ///
    /// Each bar opens at the previous close.
    pub fn generate_trending_data(days: usize, starting_price: f64, trend: f64) -> Vec<DailyOhlcv> {
        let mut data = Vec::with_capacity(days);
        let mut previous_close = starting_price;

        for i in 0..days {
            let open = previous_close;
            let close = open * (1.0 + trend);
            data.push(DailyOhlcv {
                date: bar_date(i),
                data: OhlcvData {
                    open,
                    high: open.max(close) * 1.005,
                    low: open.min(close) * 0.995,
                    close,
                    volume: 5000,
                },
            });
            previous_close = close;
        }

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_validators() {
        assert!(validate_period(5, 2).is_ok());
        assert!(validate_period(1, 2).is_err());
        let message = validate_positive(-1.0, "price").unwrap_err();
        assert!(message.contains("price"));
        assert!(validate_range(0.5, 0.0, 1.0, "weight").is_ok());
        assert!(validate_range(1.5, 0.0, 1.0, "weight").is_err());
    }

    #[test]
    fn test_load_daily_history_groups_and_sorts() {
        let file = csv_file(
            "symbol,date,open,high,low,close,volume\n\
             AAA,2021-03-02,11,12,10,11.5,100\n\
             BBB,2021-03-01,50,51,49,50.5,200\n\
             AAA,2021-03-01,10,11,9,10.5,100\n",
        );

        let history = load_daily_history(file.path()).unwrap();
        assert_eq!(history.len(), 2);
        let aaa = history.get(&Symbol::from("AAA")).unwrap();
        assert_eq!(aaa.closes(), vec![10.5, 11.5]);
    }

    #[test]
    fn test_load_daily_history_rejects_bad_rows() {
        let header = "symbol,date,open,high,low,close,volume\n";
        let bad_price = csv_file(&format!("{}AAA,2021-03-01,0,1,1,1,1\n", header));
        assert!(matches!(
            load_daily_history(bad_price.path()),
            Err(TradeError::InvalidData(_))
        ));

        let bad_date = csv_file(&format!("{}AAA,yesterday,1,1,1,1,1\n", header));
        assert!(matches!(
            load_daily_history(bad_date.path()),
            Err(TradeError::DataLoad(_))
        ));

        let empty = csv_file(header);
        assert!(load_daily_history(empty.path()).is_err());
    }

    #[test]
    fn test_load_fundamentals_and_holdings() {
        let coarse = csv_file(
            "symbol,dollar_volume,price,has_fundamental_data\n\
             AAA,1e9,20,true\n\
             BBB,5e8,3,false\n",
        );
        let rows = load_coarse(coarse.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(!rows[1].has_fundamental_data);

        let fine = csv_file("symbol,ev_to_ebitda\nAAA,12.5\n");
        assert_relative_eq!(load_fine(fine.path()).unwrap()[0].ev_to_ebitda, 12.5);

        let holdings = csv_file("symbol,quantity\nAAA,100\nBBB,-40\nCCC,0\n");
        let holdings = load_holdings(holdings.path()).unwrap();
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings.quantity(&Symbol::from("BBB")), -40.0);
    }

    #[test]
    fn test_seeded_data_is_reproducible() {
        let a = generate_seeded_data(30, 100.0, 0.05, 7);
        let b = generate_seeded_data(30, 100.0, 0.05, 7);
        assert_eq!(a, b);
        for bar in &a {
            assert!(bar.data.low > 0.0);
            assert!(bar.data.low <= bar.data.high);
        }
    }

    #[test]
    fn test_generate_test_data() {
        let data = generate_test_data(50, 100.0, 0.05);
        assert_eq!(data.len(), 50);
        assert_relative_eq!(data[0].data.open, 100.0);
        assert!(data.windows(2).all(|w| w[1].date > w[0].date));
    }

    #[test]
    fn test_trending_data() {
        let bars = data_generation::generate_trending_data(10, 100.0, 0.01);
        assert_relative_eq!(bars[1].data.open, bars[0].data.close);
        assert_relative_eq!(bars[9].data.close, 100.0 * 1.01f64.powi(10), epsilon = 1e-9);
        assert!(bars.windows(2).all(|w| w[1].date > w[0].date));
    }
}
