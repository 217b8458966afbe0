//! Payload formatting.
//!
//! Each [`Payload`] variant maps to the canonical string its wire format expects:
//! URLs, plain text, `mailto:`, `tel:`, `sms:` and `geo:` URIs, vCard 3.0 records and
//! WIFI configuration strings. Field values are inserted as given; nothing is escaped.

use std::fmt::Write;

/// Semantic input to be encoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Url(String),
    Text(String),
    Email(Email),
    Phone(String),
    Sms(Sms),
    VCard(VCard),
    Wifi(Wifi),
    Location(Location),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Email {
    pub address: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sms {
    pub number: String,
    pub message: String,
}

/// Contact card fields. Missing and empty values are both treated as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VCard {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub organization: Option<String>,
    pub phone_work: Option<String>,
    pub phone_mobile: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wifi {
    pub ssid: String,
    pub password: String,
    /// `WPA`, `WEP` or `nopass`; matched case-insensitively.
    pub encryption: String,
}

impl Wifi {
    /// A WPA network.
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Wifi {
            ssid: ssid.into(),
            password: password.into(),
            encryption: DEFAULT_WIFI_ENCRYPTION.to_string(),
        }
    }
}

pub const DEFAULT_WIFI_ENCRYPTION: &str = "WPA";

/// Coordinates kept in the caller's own textual representation.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub latitude: String,
    pub longitude: String,
}

impl Location {
    pub fn new(latitude: impl Into<String>, longitude: impl Into<String>) -> Self {
        Location {
            latitude: latitude.into(),
            longitude: longitude.into(),
        }
    }

    /// Uses the shortest decimal form of each coordinate, so `-74.0060` becomes `-74.006`.
    pub fn from_degrees(latitude: f64, longitude: f64) -> Self {
        Location::new(latitude.to_string(), longitude.to_string())
    }
}

impl Payload {
    /// The canonical string that gets encoded into the symbol.
    pub fn to_content(&self) -> String {
        match self {
            Payload::Url(url) => format_url(url),
            Payload::Text(text) => text.clone(),
            Payload::Email(email) => format_email(email),
            Payload::Phone(number) => format!("tel:{}", number),
            Payload::Sms(sms) => format_sms(sms),
            Payload::VCard(card) => format_vcard(card),
            Payload::Wifi(wifi) => format_wifi(wifi),
            Payload::Location(loc) => format!("geo:{},{}", loc.latitude, loc.longitude),
        }
    }

    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Url(_) => "url",
            Payload::Text(_) => "text",
            Payload::Email(_) => "email",
            Payload::Phone(_) => "phone",
            Payload::Sms(_) => "sms",
            Payload::VCard(_) => "vcard",
            Payload::Wifi(_) => "wifi",
            Payload::Location(_) => "location",
        }
    }
}

fn format_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

fn format_email(email: &Email) -> String {
    let mut params = Vec::new();
    if !email.subject.is_empty() {
        params.push(format!("subject={}", email.subject));
    }
    if !email.body.is_empty() {
        params.push(format!("body={}", email.body));
    }

    let mut mailto = format!("mailto:{}", email.address);
    if !params.is_empty() {
        mailto.push('?');
        mailto.push_str(&params.join("&"));
    }
    mailto
}

fn format_sms(sms: &Sms) -> String {
    if sms.message.is_empty() {
        format!("sms:{}", sms.number)
    } else {
        format!("sms:{}?body={}", sms.number, sms.message)
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

fn format_vcard(card: &VCard) -> String {
    let mut out = String::from("BEGIN:VCARD\nVERSION:3.0\n");

    let first = present(&card.first_name);
    let last = present(&card.last_name);
    if first.is_some() || last.is_some() {
        let first = first.unwrap_or_default();
        let last = last.unwrap_or_default();
        let _ = writeln!(out, "FN:{} {}", first, last);
        let _ = writeln!(out, "N:{};{}", last, first);
    }

    let lines = [
        ("ORG", &card.organization),
        ("TEL;TYPE=WORK", &card.phone_work),
        ("TEL;TYPE=CELL", &card.phone_mobile),
        ("EMAIL", &card.email),
        ("URL", &card.website),
    ];
    for (key, value) in lines {
        if let Some(value) = present(value) {
            let _ = writeln!(out, "{}:{}", key, value);
        }
    }

    let address = [&card.street, &card.city, &card.state, &card.zipcode, &card.country];
    if address.iter().any(|part| present(part).is_some()) {
        let parts: Vec<&str> = address
            .iter()
            .map(|part| part.as_deref().unwrap_or_default())
            .collect();
        let _ = writeln!(out, "ADR:;;{}", parts.join(";"));
    }

    out.push_str("END:VCARD");
    out
}

fn format_wifi(wifi: &Wifi) -> String {
    if wifi.encryption.eq_ignore_ascii_case("nopass") {
        format!("WIFI:T:nopass;S:{};;", wifi.ssid)
    } else {
        format!(
            "WIFI:T:{};S:{};P:{};;",
            wifi.encryption.to_uppercase(),
            wifi.ssid,
            wifi.password
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_scheme_prefix() {
        assert_eq!(Payload::Url("example.com".into()).to_content(), "https://example.com");
        assert_eq!(Payload::Url("http://a.io".into()).to_content(), "http://a.io");
        assert_eq!(Payload::Url("https://a.io/x".into()).to_content(), "https://a.io/x");
    }

    #[test]
    fn test_text_passthrough() {
        let text = "  spaces & symbols; kept\n";
        assert_eq!(Payload::Text(text.into()).to_content(), text);
    }

    #[test]
    fn test_email_query() {
        let mut email = Email { address: "a@b.co".into(), ..Email::default() };
        assert_eq!(Payload::Email(email.clone()).to_content(), "mailto:a@b.co");

        email.body = "hi there".into();
        assert_eq!(Payload::Email(email.clone()).to_content(), "mailto:a@b.co?body=hi there");

        email.subject = "Hello".into();
        assert_eq!(
            Payload::Email(email).to_content(),
            "mailto:a@b.co?subject=Hello&body=hi there"
        );
    }

    #[test]
    fn test_phone_and_sms() {
        assert_eq!(Payload::Phone("+15551234".into()).to_content(), "tel:+15551234");
        let sms = Sms { number: "+15551234".into(), message: String::new() };
        assert_eq!(Payload::Sms(sms.clone()).to_content(), "sms:+15551234");
        let sms = Sms { message: "on my way".into(), ..sms };
        assert_eq!(Payload::Sms(sms).to_content(), "sms:+15551234?body=on my way");
    }

    #[test]
    fn test_vcard_email_only() {
        let card = VCard { email: Some("jo@example.com".into()), ..VCard::default() };
        assert_eq!(
            Payload::VCard(card).to_content(),
            "BEGIN:VCARD\nVERSION:3.0\nEMAIL:jo@example.com\nEND:VCARD"
        );
    }

    #[test]
    fn test_vcard_full_order() {
        let card = VCard {
            first_name: Some("Ada".into()),
            last_name: Some("Lovelace".into()),
            organization: Some("Engines Ltd".into()),
            phone_work: Some("111".into()),
            phone_mobile: Some("222".into()),
            email: Some("ada@example.com".into()),
            website: Some("https://ada.dev".into()),
            street: Some("1 Main St".into()),
            city: Some("London".into()),
            state: None,
            zipcode: Some("N1".into()),
            country: Some("UK".into()),
        };
        let expected = "BEGIN:VCARD\nVERSION:3.0\n\
            FN:Ada Lovelace\nN:Lovelace;Ada\nORG:Engines Ltd\n\
            TEL;TYPE=WORK:111\nTEL;TYPE=CELL:222\nEMAIL:ada@example.com\n\
            URL:https://ada.dev\nADR:;;1 Main St;London;;N1;UK\nEND:VCARD";
        assert_eq!(Payload::VCard(card).to_content(), expected);
    }

    #[test]
    fn test_vcard_empty_strings_are_absent() {
        let card = VCard {
            last_name: Some("Solo".into()),
            organization: Some(String::new()),
            city: Some(String::new()),
            ..VCard::default()
        };
        let content = Payload::VCard(card).to_content();
        assert!(content.contains("FN: Solo\n"));
        assert!(content.contains("N:Solo;\n"));
        assert!(!content.contains("ORG"));
        assert!(!content.contains("ADR"));
    }

    #[test]
    fn test_wifi_strings() {
        let wifi = Wifi::new("Cafe", "secret1");
        assert_eq!(Payload::Wifi(wifi).to_content(), "WIFI:T:WPA;S:Cafe;P:secret1;;");

        let open = Wifi { ssid: "Lobby".into(), password: "ignored".into(), encryption: "NoPass".into() };
        assert_eq!(Payload::Wifi(open).to_content(), "WIFI:T:nopass;S:Lobby;;");

        let wep = Wifi { ssid: "Old".into(), password: String::new(), encryption: "wep".into() };
        assert_eq!(Payload::Wifi(wep).to_content(), "WIFI:T:WEP;S:Old;P:;;");
    }

    #[test]
    fn test_location() {
        let loc = Location::from_degrees(40.7128, -74.0060);
        assert_eq!(Payload::Location(loc).to_content(), "geo:40.7128,-74.006");
        let verbatim = Location::new("40.71280", "-74.00600");
        assert_eq!(Payload::Location(verbatim).to_content(), "geo:40.71280,-74.00600");
    }
}
