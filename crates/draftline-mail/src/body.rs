// SPDX-FileCopyrightText: 2026 Draftline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Body and address extraction shared by both providers.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

/// Wrap width for HTML-to-text conversion.
const TEXT_WIDTH: usize = 100;

/// A Gmail `payload` node (`format=full`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GmailPart {
    pub mime_type: String,
    pub headers: Vec<GmailHeader>,
    pub body: GmailBody,
    pub parts: Vec<GmailPart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GmailHeader {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GmailBody {
    pub data: Option<String>,
}

impl GmailPart {
    /// First header named `name`, case-insensitive.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    fn decoded(&self) -> Option<String> {
        let data = self.body.data.as_deref()?;
        decode_base64url(data)
    }

    fn find(&self, mime: &str) -> Option<String> {
        if self.mime_type.eq_ignore_ascii_case(mime)
            && let Some(text) = self.decoded()
        {
            return Some(text);
        }
        self.parts.iter().find_map(|p| p.find(mime))
    }

    /// Plain-text body: the first `text/plain` part, else the first
    /// `text/html` part converted to text.
    pub fn text_body(&self) -> String {
        if let Some(plain) = self.find("text/plain") {
            return plain.trim().to_string();
        }
        if let Some(html) = self.find("text/html") {
            return html_to_text(&html);
        }
        String::new()
    }
}

/// Gmail uses base64url, sometimes padded.
pub fn decode_base64url(data: &str) -> Option<String> {
    let trimmed = data.trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD.decode(trimmed).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render HTML as readable plain text. Falls back to the raw markup if the
/// converter fails.
pub fn html_to_text(html: &str) -> String {
    match html2text::from_read(html.as_bytes(), TEXT_WIDTH) {
        Ok(text) => text.trim().to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "html conversion failed, using raw body");
            html.trim().to_string()
        }
    }
}

/// Split `"Jane Doe <jane@example.com>"` into display name and lowercased address.
pub fn parse_address(raw: &str) -> (Option<String>, String) {
    let trimmed = raw.trim();
    if let Some((left, right)) = trimmed.rsplit_once('<') {
        let email = right.trim_end_matches('>').trim().to_ascii_lowercase();
        let name = left.trim().trim_matches('"').trim();
        let name = (!name.is_empty()).then(|| name.to_string());
        return (name, email);
    }
    let email = trimmed
        .split_whitespace()
        .find(|part| part.contains('@'))
        .unwrap_or(trimmed)
        .trim_matches(|c: char| ",;:()[]{}<>\"'".contains(c))
        .to_ascii_lowercase();
    (None, email)
}

/// Prefix `Re: ` unless the subject already carries it.
pub fn reply_subject(subject: &str) -> String {
    let trimmed = subject.trim();
    if trimmed.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("re:")) {
        trimmed.to_string()
    } else {
        format!("Re: {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE;

    fn part(mime: &str, text: &str) -> GmailPart {
        GmailPart {
            mime_type: mime.into(),
            body: GmailBody {
                data: Some(URL_SAFE.encode(text)),
            },
            ..Default::default()
        }
    }

    #[test]
    fn prefers_plain_text_part() {
        let root = GmailPart {
            mime_type: "multipart/alternative".into(),
            parts: vec![part("text/html", "<p>html</p>"), part("text/plain", "plain body")],
            ..Default::default()
        };
        assert_eq!(root.text_body(), "plain body");
    }

    #[test]
    fn falls_back_to_html() {
        let root = GmailPart {
            mime_type: "multipart/mixed".into(),
            parts: vec![GmailPart {
                mime_type: "multipart/alternative".into(),
                parts: vec![part("text/html", "<p>Where is <b>my</b> order?</p>")],
                ..Default::default()
            }],
            ..Default::default()
        };
        let text = root.text_body();
        assert!(text.contains("Where is"), "got: {text}");
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn parses_named_and_bare_addresses() {
        assert_eq!(
            parse_address("\"Jane Doe\" <Jane@Example.com>"),
            (Some("Jane Doe".into()), "jane@example.com".into())
        );
        assert_eq!(parse_address("bob@example.com"), (None, "bob@example.com".into()));
    }

    #[test]
    fn reply_prefix_added_once() {
        assert_eq!(reply_subject("Order #1001"), "Re: Order #1001");
        assert_eq!(reply_subject("RE: Order #1001"), "RE: Order #1001");
    }
}
