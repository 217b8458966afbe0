//! JSON contract between the generator and an HTTP layer.
//!
//! One [`Endpoint`] per payload variant. [`handle`] parses a request body, checks its
//! mandatory fields before the generator is involved, runs the generation and returns the
//! status code and envelope to send back. Routing itself is left to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::generator::{GenerationResult, QrGenerator};
use crate::options::{GenerationOptions, OptionsOverride, OutputFormat};
use crate::payload::{Email, Location, Payload, Sms, VCard, Wifi, DEFAULT_WIFI_ENCRYPTION};

pub const API_PREFIX: &str = "/api/v1/qr/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Url,
    Text,
    Email,
    Phone,
    Sms,
    VCard,
    Wifi,
    Location,
}

impl Endpoint {
    pub const ALL: [Endpoint; 8] = [
        Endpoint::Url,
        Endpoint::Text,
        Endpoint::Email,
        Endpoint::Phone,
        Endpoint::Sms,
        Endpoint::VCard,
        Endpoint::Wifi,
        Endpoint::Location,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Endpoint::Url => "url",
            Endpoint::Text => "text",
            Endpoint::Email => "email",
            Endpoint::Phone => "phone",
            Endpoint::Sms => "sms",
            Endpoint::VCard => "vcard",
            Endpoint::Wifi => "wifi",
            Endpoint::Location => "location",
        }
    }

    pub fn path(self) -> String {
        format!("{}{}", API_PREFIX, self.name())
    }

    /// Matches `/api/v1/qr/<name>`, ignoring a trailing slash.
    pub fn from_path(path: &str) -> Option<Self> {
        let name = path.strip_prefix(API_PREFIX)?.trim_end_matches('/');
        Self::ALL.iter().copied().find(|endpoint| endpoint.name() == name)
    }
}

/// Client errors caught before generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("{0}")]
    MissingField(&'static str),
    #[error("Invalid JSON body: {0}")]
    InvalidBody(String),
}

/// Coordinate sent either as a JSON number or a string, kept as written.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(serde_json::Number),
    Text(String),
}

impl Coordinate {
    fn into_text(self) -> String {
        match self {
            Coordinate::Number(n) => n.to_string(),
            Coordinate::Text(s) => s,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UrlRequest {
    url: Option<String>,
    options: OptionsOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TextRequest {
    text: Option<String>,
    options: OptionsOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EmailRequest {
    email: Option<String>,
    subject: Option<String>,
    message: Option<String>,
    options: OptionsOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PhoneRequest {
    phone: Option<String>,
    message: Option<String>,
    options: OptionsOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VCardRequest {
    first_name: Option<String>,
    last_name: Option<String>,
    organization: Option<String>,
    phone_work: Option<String>,
    phone_mobile: Option<String>,
    email: Option<String>,
    website: Option<String>,
    street: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zipcode: Option<String>,
    country: Option<String>,
    options: OptionsOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WifiRequest {
    ssid: Option<String>,
    password: Option<String>,
    encryption: Option<String>,
    options: OptionsOverride,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LocationRequest {
    latitude: Option<Coordinate>,
    longitude: Option<Coordinate>,
    options: OptionsOverride,
}

/// Parses a request body for `endpoint` into a payload and its options.
///
/// # Errors
///
/// [`RequestError::InvalidBody`] when the body is not a JSON object of the expected shape,
/// [`RequestError::MissingField`] when a mandatory field is absent.
pub fn parse_request(
    endpoint: Endpoint,
    body: &serde_json::Value,
) -> Result<(Payload, OptionsOverride), RequestError> {
    match body {
        serde_json::Value::Object(map) if !map.is_empty() => {}
        _ if endpoint == Endpoint::VCard => {
            return Err(RequestError::MissingField("vCard data is required"));
        }
        serde_json::Value::Object(_) => {}
        _ => return Err(RequestError::InvalidBody("expected a JSON object".into())),
    }

    match endpoint {
        Endpoint::Url => {
            let req: UrlRequest = from_value(body)?;
            let url = req.url.ok_or(RequestError::MissingField("URL is required"))?;
            Ok((Payload::Url(url), req.options))
        }
        Endpoint::Text => {
            let req: TextRequest = from_value(body)?;
            let text = req.text.ok_or(RequestError::MissingField("Text is required"))?;
            Ok((Payload::Text(text), req.options))
        }
        Endpoint::Email => {
            let req: EmailRequest = from_value(body)?;
            let address = req.email.ok_or(RequestError::MissingField("Email is required"))?;
            let email = Email {
                address,
                subject: req.subject.unwrap_or_default(),
                body: req.message.unwrap_or_default(),
            };
            Ok((Payload::Email(email), req.options))
        }
        Endpoint::Phone => {
            let req: PhoneRequest = from_value(body)?;
            let phone = req.phone.ok_or(RequestError::MissingField("Phone number is required"))?;
            Ok((Payload::Phone(phone), req.options))
        }
        Endpoint::Sms => {
            let req: PhoneRequest = from_value(body)?;
            let number = req.phone.ok_or(RequestError::MissingField("Phone number is required"))?;
            let sms = Sms {
                number,
                message: req.message.unwrap_or_default(),
            };
            Ok((Payload::Sms(sms), req.options))
        }
        Endpoint::VCard => {
            let req: VCardRequest = from_value(body)?;
            let card = VCard {
                first_name: req.first_name,
                last_name: req.last_name,
                organization: req.organization,
                phone_work: req.phone_work,
                phone_mobile: req.phone_mobile,
                email: req.email,
                website: req.website,
                street: req.street,
                city: req.city,
                state: req.state,
                zipcode: req.zipcode,
                country: req.country,
            };
            Ok((Payload::VCard(card), req.options))
        }
        Endpoint::Wifi => {
            let req: WifiRequest = from_value(body)?;
            let ssid = req.ssid.ok_or(RequestError::MissingField("SSID is required"))?;
            let wifi = Wifi {
                ssid,
                password: req.password.unwrap_or_default(),
                encryption: req
                    .encryption
                    .unwrap_or_else(|| DEFAULT_WIFI_ENCRYPTION.to_string()),
            };
            Ok((Payload::Wifi(wifi), req.options))
        }
        Endpoint::Location => {
            let req: LocationRequest = from_value(body)?;
            match (req.latitude, req.longitude) {
                (Some(lat), Some(lon)) => Ok((
                    Payload::Location(Location::new(lat.into_text(), lon.into_text())),
                    req.options,
                )),
                _ => Err(RequestError::MissingField("Latitude and longitude are required")),
            }
        }
    }
}

fn from_value<T: for<'de> Deserialize<'de>>(body: &serde_json::Value) -> Result<T, RequestError> {
    T::deserialize(body).map_err(|e| RequestError::InvalidBody(e.to_string()))
}

/// The `data` member of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QrCodeData {
    pub qr_code: String,
    pub content: String,
    pub format: OutputFormat,
    pub options: GenerationOptions,
}

/// Response envelope: `{success, data}` or `{success, error}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<QrCodeData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

impl From<GenerationResult> for ApiResponse {
    fn from(result: GenerationResult) -> Self {
        match (result.success, result.qr_code, result.format, result.options) {
            (true, Some(qr_code), Some(format), Some(options)) => ApiResponse {
                success: true,
                data: Some(QrCodeData {
                    qr_code,
                    content: result.content,
                    format,
                    options,
                }),
                error: None,
            },
            _ => ApiResponse::failure(format!(
                "Failed to generate QR code: {}",
                result.error.unwrap_or_else(|| "unknown error".to_string())
            )),
        }
    }
}

/// Runs one request end to end and returns `(status, envelope)`: 200 on success, 400 when
/// the request is rejected before generation, 500 when generation fails.
pub fn handle(
    generator: &QrGenerator,
    endpoint: Endpoint,
    body: &serde_json::Value,
) -> (u16, ApiResponse) {
    let (payload, overrides) = match parse_request(endpoint, body) {
        Ok(parsed) => parsed,
        Err(err) => return (400, ApiResponse::failure(err.to_string())),
    };
    let result = generator.generate(&payload, &overrides);
    let status = if result.success { 200 } else { 500 };
    (status, ApiResponse::from(result))
}

/// Like [`handle`], starting from the raw body text.
pub fn handle_json(generator: &QrGenerator, endpoint: Endpoint, body: &str) -> (u16, ApiResponse) {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => handle(generator, endpoint, &value),
        Err(err) => (400, ApiResponse::failure(RequestError::InvalidBody(err.to_string()).to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_endpoint_paths() {
        for endpoint in Endpoint::ALL {
            assert_eq!(Endpoint::from_path(&endpoint.path()), Some(endpoint));
        }
        assert_eq!(Endpoint::from_path("/api/v1/qr/wifi/"), Some(Endpoint::Wifi));
        assert_eq!(Endpoint::from_path("/api/v1/qr/barcode"), None);
        assert_eq!(Endpoint::from_path("/health"), None);
    }

    #[test]
    fn test_missing_fields() {
        let cases = [
            (Endpoint::Url, json!({"options": {}}), "URL is required"),
            (Endpoint::Text, json!({"txt": "x"}), "Text is required"),
            (Endpoint::Email, json!({"subject": "x"}), "Email is required"),
            (Endpoint::Phone, json!({"message": "x"}), "Phone number is required"),
            (Endpoint::Sms, json!({"message": "x"}), "Phone number is required"),
            (Endpoint::Wifi, json!({"password": "x"}), "SSID is required"),
            (Endpoint::Location, json!({"latitude": 1.5}), "Latitude and longitude are required"),
            (Endpoint::VCard, json!({}), "vCard data is required"),
            (Endpoint::VCard, json!(null), "vCard data is required"),
        ];
        for (endpoint, body, message) in cases {
            let err = parse_request(endpoint, &body).unwrap_err();
            assert_eq!(err, RequestError::MissingField(message));
        }
    }

    #[test]
    fn test_wifi_defaults_to_wpa() {
        let (payload, _) = parse_request(Endpoint::Wifi, &json!({"ssid": "Cafe", "password": "pw"})).unwrap();
        assert_eq!(payload.to_content(), "WIFI:T:WPA;S:Cafe;P:pw;;");
    }

    #[test]
    fn test_location_numbers_and_strings() {
        let body = json!({"latitude": 40.7128, "longitude": -74.0060});
        let (payload, _) = parse_request(Endpoint::Location, &body).unwrap();
        assert_eq!(payload.to_content(), "geo:40.7128,-74.006");

        let body = json!({"latitude": "40.71280", "longitude": "-74.00600"});
        let (payload, _) = parse_request(Endpoint::Location, &body).unwrap();
        assert_eq!(payload.to_content(), "geo:40.71280,-74.00600");
    }

    #[test]
    fn test_null_optional_fields_are_absent() {
        let body = json!({"email": "a@b.c", "subject": null, "message": null});
        let (payload, _) = parse_request(Endpoint::Email, &body).unwrap();
        assert_eq!(payload.to_content(), "mailto:a@b.c");

        let body = json!({"phone": "+1555", "message": null});
        let (payload, _) = parse_request(Endpoint::Sms, &body).unwrap();
        assert_eq!(payload.to_content(), "sms:+1555");

        let body = json!({"ssid": "Open", "password": null, "encryption": null});
        let (payload, _) = parse_request(Endpoint::Wifi, &body).unwrap();
        assert_eq!(payload.to_content(), "WIFI:T:WPA;S:Open;P:;;");

        let generator = QrGenerator::default();
        let body = json!({"email": "a@b.c", "subject": null});
        let (status, response) = handle(&generator, Endpoint::Email, &body);
        assert_eq!(status, 200);
        assert!(response.success);
    }

    #[test]
    fn test_wrong_field_type_is_client_error() {
        let err = parse_request(Endpoint::Url, &json!({"url": 42})).unwrap_err();
        assert!(matches!(err, RequestError::InvalidBody(_)));
    }

    #[test]
    fn test_success_envelope() {
        let generator = QrGenerator::default();
        let body = json!({"url": "example.com", "options": {"format": "svg", "size": 5}});
        let (status, response) = handle(&generator, Endpoint::Url, &body);
        assert_eq!(status, 200);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["content"], "https://example.com");
        assert_eq!(value["data"]["format"], "SVG");
        assert_eq!(value["data"]["options"]["size"], 5);
        assert_eq!(value["data"]["options"]["border"], 4);
        assert!(value["data"]["qr_code"].as_str().unwrap().starts_with("data:image/svg+xml;base64,"));
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_error_envelopes() {
        let generator = QrGenerator::default();
        let (status, response) = handle_json(&generator, Endpoint::Text, "{not json");
        assert_eq!(status, 400);
        assert!(!response.success);

        let big = "z".repeat(3000);
        let body = json!({"text": big, "options": {"error_correction": "H"}});
        let (status, response) = handle(&generator, Endpoint::Text, &body);
        assert_eq!(status, 500);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], false);
        assert!(value["error"].as_str().unwrap().starts_with("Failed to generate QR code:"));
        assert!(value.get("data").is_none());
    }
}
