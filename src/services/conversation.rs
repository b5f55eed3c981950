use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    ConversationSession, Hotel, Reservation, ReservationStatus, SessionKey, Step,
    SESSION_TTL_MINUTES,
};
use crate::services::pricing;
use crate::state::AppState;

/// Handles one inbound message end to end: resolve the receiving hotel,
/// advance that guest's session by exactly one step, and produce the reply.
///
/// An `Err` means the step itself failed; in that case the session is left in
/// its pre-step state so the same message can be retried. Gate outcomes (no
/// hotel, inactive hotel) are ordinary replies, not errors, and never create
/// a session.
pub async fn process_message(
    state: &Arc<AppState>,
    from: &str,
    to: &str,
    body: &str,
) -> anyhow::Result<String> {
    // Directory gate, re-checked on every turn.
    let hotel = {
        let db = state.db.lock().unwrap();
        queries::get_hotel_by_number(&db, to)?
    };

    let hotel = match hotel {
        Some(h) if h.is_active => h,
        Some(h) => {
            tracing::info!(hotel = %h.name, from = %from, "hotel is inactive");
            return Ok(format!(
                "{} is not taking bookings right now. Please try again later.",
                h.name
            ));
        }
        None => {
            tracing::warn!(to = %to, "no hotel configured for this number");
            return Ok("Sorry, this number is not set up for bookings.".to_string());
        }
    };

    let key = SessionKey {
        hotel_id: hotel.id.clone(),
        phone: from.to_string(),
    };

    // One in-flight transition per key: the entry lock is held across the
    // whole read-step-persist-write cycle.
    let cell = state.sessions.entry(&key);
    let mut session = cell.lock().await;

    let now = Utc::now().naive_utc();
    if session.is_expired(now) {
        *session = ConversationSession::fresh();
    }

    // Step on a scratch copy; a failed step must not advance the session.
    let mut next = session.clone();
    let (reply, done) = step(state, &hotel, from, &mut next, body).await?;

    tracing::info!(
        from = %from,
        hotel = %hotel.name,
        step = next.step.as_str(),
        done,
        "processed message"
    );

    if done {
        // Anyone already queued on this entry starts a new conversation. The
        // entry is only dropped from the map while no such waiter exists, so
        // a queued transition always lands in a cell the map still owns.
        *session = ConversationSession::fresh();
        drop(session);
        state.sessions.remove_if_idle(&key, &cell);
    } else {
        next.expires_at = now + Duration::minutes(SESSION_TTL_MINUTES);
        *session = next;
    }

    Ok(reply)
}

/// One state-machine transition. Returns the reply plus whether the
/// conversation is finished and the session should be destroyed.
async fn step(
    state: &Arc<AppState>,
    hotel: &Hotel,
    phone: &str,
    session: &mut ConversationSession,
    body: &str,
) -> anyhow::Result<(String, bool)> {
    let text = body.trim();

    let reply = match session.step {
        Step::Start => {
            session.step = Step::Checkin;
            format!(
                "Welcome to {}! I can help you book a room.\n\
                 What is your check-in date? (YYYY-MM-DD)",
                hotel.name
            )
        }

        // Dates are stored verbatim here; they are validated once, at the
        // guest-count step, where the quote is computed.
        Step::Checkin => {
            session.checkin = Some(text.to_string());
            session.step = Step::Checkout;
            "Got it. What is your check-out date? (YYYY-MM-DD)".to_string()
        }

        Step::Checkout => {
            session.checkout = Some(text.to_string());
            session.step = Step::Guests;
            "And how many guests will be staying?".to_string()
        }

        Step::Guests => {
            // Permissive on purpose: an unparseable count is recorded as
            // unknown rather than blocking the quote.
            session.guests = text.parse::<i64>().ok();

            let checkin = session.checkin.clone().unwrap_or_default();
            let checkout = session.checkout.clone().unwrap_or_default();

            match quote(&checkin, &checkout, hotel.price_per_night) {
                Ok((nights, total)) => {
                    session.nights = Some(nights);
                    session.price_per_night = Some(hotel.price_per_night);
                    session.total = Some(total);
                    session.step = Step::Confirm;

                    let guests = session
                        .guests
                        .map(|g| g.to_string())
                        .unwrap_or_else(|| "-".to_string());
                    format!(
                        "Here is your quote for {}:\n\
                         Check-in: {checkin}\n\
                         Check-out: {checkout}\n\
                         Guests: {guests}\n\
                         {nights} night(s) x {rate} {currency} = {total} {currency}\n\
                         Reply YES to confirm your booking.",
                        hotel.name,
                        rate = hotel.price_per_night,
                        currency = hotel.currency,
                    )
                }
                // Unusable dates restart date collection; the session is kept.
                Err(AppError::InvalidDate(input)) => {
                    restart_dates(session);
                    format!(
                        "I couldn't read \"{input}\" as a date. Let's try again.\n\
                         What is your check-in date? (YYYY-MM-DD)"
                    )
                }
                Err(AppError::InvalidDateRange { .. }) => {
                    restart_dates(session);
                    "Your check-out date must be after your check-in date. Let's try again.\n\
                     What is your check-in date? (YYYY-MM-DD)"
                        .to_string()
                }
                Err(e) => return Err(e.into()),
            }
        }

        Step::Confirm => {
            if text.to_lowercase().contains("yes") {
                return confirm(state, hotel, phone, session).await;
            }
            *session = ConversationSession::fresh();
            "No problem, I've cancelled that request. Send any message to start a new booking."
                .to_string()
        }
    };

    Ok((reply, false))
}

/// Computes the quote once. Zero-night and inverted stays are rejected here
/// rather than quoted at zero or negative totals.
fn quote(checkin: &str, checkout: &str, rate: Decimal) -> Result<(i64, Decimal), AppError> {
    let nights = pricing::nights(checkin, checkout)?;
    if nights < 1 {
        return Err(AppError::InvalidDateRange {
            checkin: checkin.trim().to_string(),
            checkout: checkout.trim().to_string(),
        });
    }
    Ok((nights, pricing::total(nights, rate)))
}

async fn confirm(
    state: &Arc<AppState>,
    hotel: &Hotel,
    phone: &str,
    session: &mut ConversationSession,
) -> anyhow::Result<(String, bool)> {
    let reservation = Reservation {
        reference_no: new_reference(),
        hotel_id: hotel.id.clone(),
        phone: phone.to_string(),
        hotel_name: hotel.name.clone(),
        checkin: session.checkin.clone().unwrap_or_default(),
        checkout: session.checkout.clone().unwrap_or_default(),
        guests: session.guests,
        nights: session.nights.unwrap_or_default(),
        // The rate captured at quote time, never the hotel's current rate.
        price_per_night: session.price_per_night.unwrap_or(hotel.price_per_night),
        total: session.total.unwrap_or_default(),
        status: ReservationStatus::Confirmed,
        created_at: Utc::now().naive_utc(),
    };

    let inserted = {
        let db = state.db.lock().unwrap();
        queries::create_reservation(&db, &reservation)
    };

    match inserted {
        Ok(()) => {
            tracing::info!(
                reference = %reservation.reference_no,
                hotel = %hotel.name,
                phone = %phone,
                total = %reservation.total,
                "reservation confirmed"
            );
            Ok((
                format!(
                    "Your booking at {} is confirmed!\n\
                     Reference: {}\n\
                     Total: {} {}\n\
                     We look forward to welcoming you.",
                    hotel.name, reservation.reference_no, reservation.total, hotel.currency
                ),
                true,
            ))
        }
        Err(e) => {
            // The session is kept at the confirm step so the guest can retry.
            tracing::error!(error = %e, phone = %phone, "failed to save reservation");
            Ok((
                "Sorry, something went wrong saving your booking. Please reply YES to try again."
                    .to_string(),
                false,
            ))
        }
    }
}

fn restart_dates(session: &mut ConversationSession) {
    session.checkin = None;
    session.checkout = None;
    session.nights = None;
    session.price_per_night = None;
    session.total = None;
    session.step = Step::Checkin;
}

fn new_reference() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("BK-{}", id[..12].to_uppercase())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn quote_multiplies_nights_by_rate() {
        let (nights, total) = quote("2024-05-01", "2024-05-04", dec("50.00")).unwrap();
        assert_eq!(nights, 3);
        assert_eq!(total, dec("150.00"));
    }

    #[test]
    fn quote_rejects_same_day_stay() {
        let err = quote("2024-05-01", "2024-05-01", dec("50.00")).unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange { .. }));
    }

    #[test]
    fn quote_rejects_inverted_range() {
        let err = quote("2024-05-04", "2024-05-01", dec("50.00")).unwrap_err();
        assert!(matches!(err, AppError::InvalidDateRange { .. }));
    }

    #[test]
    fn quote_rejects_garbage_dates() {
        let err = quote("next tuesday", "2024-05-04", dec("50.00")).unwrap_err();
        assert!(matches!(err, AppError::InvalidDate(_)));
    }

    #[test]
    fn references_are_unique_and_prefixed() {
        let refs: HashSet<String> = (0..200).map(|_| new_reference()).collect();
        assert_eq!(refs.len(), 200);
        for r in &refs {
            assert!(r.starts_with("BK-"));
            assert_eq!(r.len(), "BK-".len() + 12);
        }
    }
}
