// Seeds the flights source database with random data
use anyhow::{Context, Result};
use chrono::{Local, NaiveTime, TimeDelta};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::{params, Connection};
use std::path::Path;

const AIRPORTS: [&str; 10] = ["GRU", "GIG", "BSB", "CGH", "SDU", "VCP", "POA", "SSA", "FOR", "REC"];

const AIRLINES: [&str; 6] = ["Azul", "Gol", "LATAM", "Passaredo", "Itapemirim", "Voepass"];

const STATUSES: [&str; 6] = ["Scheduled", "Boarding", "Departed", "Arrived", "Cancelled", "Delayed"];
const STATUS_WEIGHTS: [u32; 6] = [25, 10, 25, 20, 5, 15];

const CREATE_TABLE_SQL: &str = "
CREATE TABLE IF NOT EXISTS flights (
    flight_id INTEGER PRIMARY KEY,
    origin TEXT NOT NULL,
    destination TEXT NOT NULL,
    departure DATE NOT NULL,
    departure_time TIME NOT NULL,
    arrival DATE NOT NULL,
    arrival_time TIME NOT NULL,
    airline TEXT NOT NULL,
    status TEXT NOT NULL,
    aircraft TEXT NOT NULL,
    distance_km INTEGER NOT NULL,
    passengers INTEGER NOT NULL
)";

const INSERT_SQL: &str = "
INSERT INTO flights (
    flight_id, origin, destination, departure, departure_time, arrival,
    arrival_time, airline, status, aircraft, distance_km, passengers
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

#[derive(Debug, Clone)]
struct FlightRow {
    flight_id: i64,
    origin: &'static str,
    destination: &'static str,
    departure: String,
    departure_time: String,
    arrival: String,
    arrival_time: String,
    airline: &'static str,
    status: &'static str,
    aircraft: String,
    distance_km: i64,
    passengers: i64,
}

/// Create the flights table and reseed it when it holds fewer than `rows` rows.
pub fn init_database(path: &Path, rows: usize) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
    }
    let mut conn = Connection::open(path)
        .with_context(|| format!("Failed to open database {}", path.display()))?;
    conn.execute_batch(CREATE_TABLE_SQL)
        .context("Failed to create flights table")?;

    let current: i64 = conn.query_row("SELECT COUNT(*) FROM flights", [], |row| row.get(0))?;
    if usize::try_from(current).unwrap_or(0) >= rows {
        tracing::info!("Flights table already holds {} rows", current);
        return Ok(());
    }

    let seed = generate_rows(rows)?;
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM flights", [])?;
    {
        let mut stmt = tx.prepare(INSERT_SQL)?;
        for row in &seed {
            stmt.execute(params![
                row.flight_id,
                row.origin,
                row.destination,
                row.departure,
                row.departure_time,
                row.arrival,
                row.arrival_time,
                row.airline,
                row.status,
                row.aircraft,
                row.distance_km,
                row.passengers,
            ])?;
        }
    }
    tx.commit().context("Failed to commit seed data")?;
    tracing::info!("Seeded flights table with {} rows", seed.len());
    Ok(())
}

fn generate_rows(rows: usize) -> Result<Vec<FlightRow>> {
    let mut rng = rand::thread_rng();
    let statuses = WeightedIndex::new(STATUS_WEIGHTS).context("Invalid status weights")?;
    let today = Local::now().date_naive();

    let mut data = Vec::with_capacity(rows);
    for flight_id in 1..=rows {
        let route: Vec<&'static str> = AIRPORTS.choose_multiple(&mut rng, 2).copied().collect();
        let departure_date = today + TimeDelta::days(rng.gen_range(-30..=30));
        let minutes: u32 = rng.gen_range(0..=23 * 60 + 59);
        let departure_time = NaiveTime::from_num_seconds_from_midnight_opt(minutes * 60, 0)
            .context("Generated an invalid departure time")?;
        let arrival = departure_date.and_time(departure_time) + TimeDelta::minutes(rng.gen_range(60..=240));
        let aircraft_family = ['A', 'B', 'E'][rng.gen_range(0..3)];

        data.push(FlightRow {
            flight_id: i64::try_from(flight_id)?,
            origin: route[0],
            destination: route[1],
            departure: departure_date.format("%Y-%m-%d").to_string(),
            departure_time: departure_time.format("%H:%M:%S").to_string(),
            arrival: arrival.date().format("%Y-%m-%d").to_string(),
            arrival_time: arrival.time().format("%H:%M:%S").to_string(),
            airline: AIRLINES[rng.gen_range(0..AIRLINES.len())],
            status: STATUSES[statuses.sample(&mut rng)],
            aircraft: format!("{}{}", aircraft_family, rng.gen_range(100..=999)),
            distance_km: rng.gen_range(200..=3500),
            passengers: rng.gen_range(50..=250),
        });
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_rows_are_well_formed() {
        let rows = generate_rows(200).unwrap();
        assert_eq!(rows.len(), 200);
        for row in &rows {
            assert_ne!(row.origin, row.destination);
            assert!((200..=3500).contains(&row.distance_km));
            assert!((50..=250).contains(&row.passengers));
            assert!(STATUSES.contains(&row.status));
            assert_eq!(row.aircraft.len(), 4);
        }
    }

    #[test]
    fn test_init_database_seeds_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("flights.sqlite");
        init_database(&path, 50).unwrap();

        let conn = Connection::open(&path).unwrap();
        let first_route: String = conn
            .query_row("SELECT origin || destination FROM flights WHERE flight_id = 1", [], |r| r.get(0))
            .unwrap();
        drop(conn);

        // Already at the target size, so the data is left alone
        init_database(&path, 50).unwrap();
        let conn = Connection::open(&path).unwrap();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM flights", [], |r| r.get(0)).unwrap();
        let route: String = conn
            .query_row("SELECT origin || destination FROM flights WHERE flight_id = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 50);
        assert_eq!(route, first_route);
    }
}
