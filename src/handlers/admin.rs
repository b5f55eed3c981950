use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Hotel, Reservation};
use crate::state::AppState;

const RESERVATIONS_LIMIT: i64 = 100;
const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Deserialize)]
pub struct AdminQuery {
    pub token: Option<String>,
    pub hotel_id: Option<String>,
}

fn check_token(query: &AdminQuery, expected: &str) -> Result<(), AppError> {
    if query.token.as_deref() != Some(expected) {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

// GET /admin/reservations?hotel_id=<id>&token=<token>
#[derive(Serialize)]
pub struct ReservationResponse {
    reference_no: String,
    hotel_id: String,
    phone: String,
    hotel_name: String,
    checkin: String,
    checkout: String,
    guests: Option<i64>,
    nights: i64,
    price_per_night: Decimal,
    total: Decimal,
    status: String,
    created_at: String,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            reference_no: r.reference_no,
            hotel_id: r.hotel_id,
            phone: r.phone,
            hotel_name: r.hotel_name,
            checkin: r.checkin,
            checkout: r.checkout,
            guests: r.guests,
            nights: r.nights,
            price_per_night: r.price_per_night,
            total: r.total,
            status: r.status.as_str().to_string(),
            created_at: r.created_at.format(DATETIME_FMT).to_string(),
        }
    }
}

pub async fn get_reservations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<Vec<ReservationResponse>>, AppError> {
    check_token(&query, &state.config.admin_token)?;

    let reservations = {
        let db = state.db.lock().unwrap();
        queries::list_reservations(&db, query.hotel_id.as_deref(), Some(RESERVATIONS_LIMIT))?
    };

    Ok(Json(
        reservations
            .into_iter()
            .map(ReservationResponse::from)
            .collect(),
    ))
}

// GET /admin/hotels?token=<token>
#[derive(Serialize)]
pub struct HotelResponse {
    id: String,
    name: String,
    whatsapp_number: String,
    price_per_night: Decimal,
    currency: String,
    is_active: bool,
    created_at: String,
}

impl From<Hotel> for HotelResponse {
    fn from(h: Hotel) -> Self {
        Self {
            id: h.id,
            name: h.name,
            whatsapp_number: h.whatsapp_number,
            price_per_night: h.price_per_night,
            currency: h.currency,
            is_active: h.is_active,
            created_at: h.created_at.format(DATETIME_FMT).to_string(),
        }
    }
}

pub async fn get_hotels(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Json<Vec<HotelResponse>>, AppError> {
    check_token(&query, &state.config.admin_token)?;

    let hotels = {
        let db = state.db.lock().unwrap();
        queries::list_hotels(&db)?
    };

    Ok(Json(hotels.into_iter().map(HotelResponse::from).collect()))
}

// GET /admin/export?hotel_id=<id>&token=<token>
pub async fn export_reservations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> Result<Response, AppError> {
    check_token(&query, &state.config.admin_token)?;

    // The export is a full dump; only the JSON listing is capped.
    let reservations = {
        let db = state.db.lock().unwrap();
        queries::list_reservations(&db, query.hotel_id.as_deref(), None)?
    };

    let mut csv = String::from(
        "Reference,HotelId,Phone,Checkin,Checkout,Guests,Nights,Price Per Night,Total,Status,Created At\n",
    );
    for r in reservations {
        let guests = r.guests.map(|g| g.to_string()).unwrap_or_default();
        csv.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{}\n",
            r.reference_no,
            r.hotel_id,
            r.phone,
            r.checkin,
            r.checkout,
            guests,
            r.nights,
            r.price_per_night,
            r.total,
            r.status.as_str(),
            r.created_at.format(DATETIME_FMT),
        ));
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"reservations.csv\"",
            ),
        ],
        csv,
    )
        .into_response())
}
