use chrono::{Duration, NaiveDateTime, Utc};
use rust_decimal::Decimal;

/// Sliding idle timeout after which a conversation is treated as abandoned.
pub const SESSION_TTL_MINUTES: i64 = 30;

/// Position in the linear quote-and-confirm flow. The enum is closed, so an
/// unrecognized step is unrepresentable and every transition is matched
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Start,
    Checkin,
    Checkout,
    Guests,
    Confirm,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Start => "start",
            Step::Checkin => "checkin",
            Step::Checkout => "checkout",
            Step::Guests => "guests",
            Step::Confirm => "confirm",
        }
    }
}

/// One in-progress conversation: a guest phone talking to one hotel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub hotel_id: String,
    pub phone: String,
}

/// Per-conversation state. Nights and prices are filled in exactly once, at
/// the guest-count step, and carried unmodified into the persisted record so
/// the quote and the confirmation can never diverge.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    pub step: Step,
    pub checkin: Option<String>,
    pub checkout: Option<String>,
    pub guests: Option<i64>,
    pub nights: Option<i64>,
    pub price_per_night: Option<Decimal>,
    pub total: Option<Decimal>,
    pub expires_at: NaiveDateTime,
}

impl ConversationSession {
    pub fn fresh() -> Self {
        Self {
            step: Step::Start,
            checkin: None,
            checkout: None,
            guests: None,
            nights: None,
            price_per_night: None,
            total: None,
            expires_at: Utc::now().naive_utc() + Duration::minutes(SESSION_TTL_MINUTES),
        }
    }

    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at <= now
    }
}
