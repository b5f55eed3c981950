use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A confirmed booking. Insert-only: once written, this record is never
/// mutated by the conversation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    pub reference_no: String,
    pub hotel_id: String,
    pub phone: String,
    pub hotel_name: String,
    pub checkin: String,
    pub checkout: String,
    pub guests: Option<i64>,
    pub nights: i64,
    pub price_per_night: Decimal,
    pub total: Decimal,
    pub status: ReservationStatus,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Confirmed => "confirmed",
            ReservationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "cancelled" => ReservationStatus::Cancelled,
            _ => ReservationStatus::Confirmed,
        }
    }
}
