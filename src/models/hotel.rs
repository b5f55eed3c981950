use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A business identity reachable over one WhatsApp number. Resolved fresh on
/// every inbound message; the conversation engine never caches it across turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotel {
    pub id: String,
    pub name: String,
    pub whatsapp_number: String,
    pub price_per_night: Decimal,
    pub currency: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}
