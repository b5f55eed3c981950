//! Rendering of replies in Twilio's TwiML response envelope.

/// Escapes the five XML-special characters. Everything placed inside a TwiML
/// element goes through here.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn message_response(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
        escape(body)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_five_specials() {
        assert_eq!(
            escape(r#"Surf & Sand <suite> "sea view" 'deluxe'"#),
            "Surf &amp; Sand &lt;suite&gt; &quot;sea view&quot; &apos;deluxe&apos;"
        );
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(escape("Reply YES to confirm."), "Reply YES to confirm.");
    }

    #[test]
    fn message_is_wrapped_and_escaped() {
        let xml = message_response("Tea & scones");
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>Tea &amp; scones</Message></Response>"
        );
    }

}
