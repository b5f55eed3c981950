use anyhow::Context;
use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::models::{Hotel, Reservation, ReservationStatus};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

// ── Hotels ──

pub fn create_hotel(conn: &Connection, hotel: &Hotel) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO hotels (id, name, whatsapp_number, price_per_night, currency, is_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            hotel.id,
            hotel.name,
            hotel.whatsapp_number,
            hotel.price_per_night.to_string(),
            hotel.currency,
            hotel.is_active,
            hotel.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

pub fn get_hotel_by_number(conn: &Connection, number: &str) -> anyhow::Result<Option<Hotel>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, whatsapp_number, price_per_night, currency, is_active, created_at
         FROM hotels WHERE whatsapp_number = ?1",
    )?;

    let result = stmt.query_row(params![number], |row| Ok(parse_hotel_row(row)));

    match result {
        Ok(hotel) => Ok(Some(hotel?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_hotels(conn: &Connection) -> anyhow::Result<Vec<Hotel>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, whatsapp_number, price_per_night, currency, is_active, created_at
         FROM hotels ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map([], |row| Ok(parse_hotel_row(row)))?;

    let mut hotels = vec![];
    for row in rows {
        hotels.push(row??);
    }
    Ok(hotels)
}

fn parse_hotel_row(row: &Row) -> anyhow::Result<Hotel> {
    let price_str: String = row.get(3)?;
    let created_str: String = row.get(6)?;

    Ok(Hotel {
        id: row.get(0)?,
        name: row.get(1)?,
        whatsapp_number: row.get(2)?,
        price_per_night: price_str
            .parse()
            .with_context(|| format!("bad price_per_night in hotels row: {price_str}"))?,
        currency: row.get(4)?,
        is_active: row.get(5)?,
        created_at: parse_datetime(&created_str),
    })
}

// ── Reservations ──

pub fn create_reservation(conn: &Connection, reservation: &Reservation) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO reservations (reference_no, hotel_id, phone, hotel_name, checkin, checkout,
                                   guests, nights, price_per_night, total, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            reservation.reference_no,
            reservation.hotel_id,
            reservation.phone,
            reservation.hotel_name,
            reservation.checkin,
            reservation.checkout,
            reservation.guests,
            reservation.nights,
            reservation.price_per_night.to_string(),
            reservation.total.to_string(),
            reservation.status.as_str(),
            reservation.created_at.format(DATETIME_FMT).to_string(),
        ],
    )?;
    Ok(())
}

/// Newest first, optionally filtered by hotel. `limit: None` returns every
/// row (the CSV export must not truncate).
pub fn list_reservations(
    conn: &Connection,
    hotel_id: Option<&str>,
    limit: Option<i64>,
) -> anyhow::Result<Vec<Reservation>> {
    let mut sql = String::from(
        "SELECT reference_no, hotel_id, phone, hotel_name, checkin, checkout, guests, nights,
                price_per_night, total, status, created_at
         FROM reservations",
    );
    let mut params_vec: Vec<Box<dyn rusqlite::types::ToSql>> = vec![];

    if let Some(id) = hotel_id {
        sql.push_str(" WHERE hotel_id = ?1");
        params_vec.push(Box::new(id.to_string()));
    }
    sql.push_str(" ORDER BY created_at DESC");
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT ?{}", params_vec.len() + 1));
        params_vec.push(Box::new(limit));
    }

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_reservation_row(row)))?;

    let mut reservations = vec![];
    for row in rows {
        reservations.push(row??);
    }
    Ok(reservations)
}

fn parse_reservation_row(row: &Row) -> anyhow::Result<Reservation> {
    let price_str: String = row.get(8)?;
    let total_str: String = row.get(9)?;
    let status_str: String = row.get(10)?;
    let created_str: String = row.get(11)?;

    Ok(Reservation {
        reference_no: row.get(0)?,
        hotel_id: row.get(1)?,
        phone: row.get(2)?,
        hotel_name: row.get(3)?,
        checkin: row.get(4)?,
        checkout: row.get(5)?,
        guests: row.get(6)?,
        nights: row.get(7)?,
        price_per_night: price_str
            .parse()
            .with_context(|| format!("bad price_per_night in reservations row: {price_str}"))?,
        total: total_str
            .parse()
            .with_context(|| format!("bad total in reservations row: {total_str}"))?,
        status: ReservationStatus::parse(&status_str),
        created_at: parse_datetime(&created_str),
    })
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT).unwrap_or_else(|_| Utc::now().naive_utc())
}
