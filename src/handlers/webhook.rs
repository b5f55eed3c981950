use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Form;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha1::Sha1;

use crate::services::{conversation, twiml};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct WhatsAppWebhookForm {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "To")]
    pub to: String,
    #[serde(rename = "Body")]
    pub body: String,
    #[serde(rename = "MessageSid")]
    pub message_sid: Option<String>,
}

fn validate_twilio_signature(
    auth_token: &str,
    signature: &str,
    url: &str,
    params: &[(&str, &str)],
) -> bool {
    // Twilio signs URL + params concatenated in sorted key order.
    let mut data = url.to_string();
    let mut sorted_params = params.to_vec();
    sorted_params.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in &sorted_params {
        data.push_str(key);
        data.push_str(value);
    }

    let mut mac = match Hmac::<Sha1>::new_from_slice(auth_token.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(data.as_bytes());
    let expected = base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes());

    expected == signature
}

pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<WhatsAppWebhookForm>,
) -> Response {
    let from = form.from.trim().to_string();
    let body = form.body.trim().to_string();

    tracing::info!(from = %from, to = %form.to, body = %body, "incoming message");

    // Signature check is skipped when no auth token is configured (dev mode).
    if !state.config.twilio_auth_token.is_empty() {
        let signature = headers
            .get("x-twilio-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if signature.is_empty() {
            tracing::warn!("missing X-Twilio-Signature header");
            return (StatusCode::FORBIDDEN, "Missing signature").into_response();
        }

        // Reconstruct the webhook URL; honor proxy headers when present.
        let proto = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("https");
        let host = headers
            .get("x-forwarded-host")
            .or_else(|| headers.get("host"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("localhost");
        let url = format!("{proto}://{host}/webhook/whatsapp");

        let params = [
            ("From", from.as_str()),
            ("To", form.to.as_str()),
            ("Body", body.as_str()),
            ("MessageSid", form.message_sid.as_deref().unwrap_or("")),
        ];

        if !validate_twilio_signature(&state.config.twilio_auth_token, signature, &url, &params) {
            tracing::warn!("invalid Twilio signature");
            return (StatusCode::FORBIDDEN, "Invalid signature").into_response();
        }
    }

    let reply = match conversation::process_message(&state, &from, &form.to, &body).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, from = %from, "conversation processing failed");
            "Sorry, something went wrong on our side. Please try again in a moment.".to_string()
        }
    };

    // Opportunistic sweep of abandoned conversations.
    let purged = state.sessions.purge_expired();
    if purged > 0 {
        tracing::debug!(purged, "dropped expired sessions");
    }

    (
        [(header::CONTENT_TYPE, "application/xml")],
        twiml::message_response(&reply),
    )
        .into_response()
}
