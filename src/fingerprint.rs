//! Device fingerprinting
//!
//! Clients report a handful of device attributes at login. The server
//! canonicalises them and hashes the result so the same device maps to the
//! same fingerprint across sessions, whatever order the client sent them in.

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub user_agent: Option<String>,
    pub platform: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    /// e.g. "1920x1080"
    pub screen: Option<String>,
    pub color_depth: Option<u32>,
    pub hardware_concurrency: Option<u32>,
    pub touch_points: Option<u32>,
}

impl DeviceInfo {
    /// Fallback when the client did not report anything: use request headers
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let get = |name: header::HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            user_agent: get(header::USER_AGENT),
            language: get(header::ACCEPT_LANGUAGE),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == DeviceInfo::default()
    }

    fn canonical(&self) -> String {
        fn text(value: &Option<String>) -> String {
            value
                .as_deref()
                .map(|v| v.trim().to_lowercase())
                .unwrap_or_default()
        }
        fn number(value: &Option<u32>) -> String {
            value.map(|v| v.to_string()).unwrap_or_default()
        }

        // name:len:value, so no value can spill into a neighbouring field
        [
            ("user_agent", text(&self.user_agent)),
            ("platform", text(&self.platform)),
            ("language", text(&self.language)),
            ("timezone", text(&self.timezone)),
            ("screen", text(&self.screen)),
            ("color_depth", number(&self.color_depth)),
            ("hardware_concurrency", number(&self.hardware_concurrency)),
            ("touch_points", number(&self.touch_points)),
        ]
        .iter()
        .map(|(name, value)| format!("{}:{}:{}", name, value.len(), value))
        .collect::<Vec<_>>()
        .join("|")
    }
}

/// Hex SHA-256 over the canonical device attributes
pub fn fingerprint(device: &DeviceInfo) -> String {
    let mut hasher = Sha256::new();
    hasher.update(device.canonical().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fingerprint from the reported device, or from headers when none was sent
pub fn resolve(device: Option<&DeviceInfo>, headers: &HeaderMap) -> String {
    match device {
        Some(d) if !d.is_empty() => fingerprint(d),
        _ => fingerprint(&DeviceInfo::from_headers(headers)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn laptop() -> DeviceInfo {
        DeviceInfo {
            user_agent: Some("Mozilla/5.0 (X11; Linux x86_64)".into()),
            platform: Some("Linux x86_64".into()),
            language: Some("en-US".into()),
            timezone: Some("Europe/Berlin".into()),
            screen: Some("1920x1080".into()),
            color_depth: Some(24),
            hardware_concurrency: Some(8),
            touch_points: Some(0),
        }
    }

    #[test]
    fn same_device_same_fingerprint() {
        let a = fingerprint(&laptop());
        let mut b = laptop();
        b.language = Some("  EN-us ".into());
        assert_eq!(a, fingerprint(&b));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn separator_in_a_value_cannot_shift_fields() {
        let a = DeviceInfo {
            user_agent: Some("x|y".into()),
            platform: Some(String::new()),
            ..Default::default()
        };
        let b = DeviceInfo {
            user_agent: Some("x".into()),
            platform: Some("y|".into()),
            ..Default::default()
        };
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn different_device_different_fingerprint() {
        let mut other = laptop();
        other.screen = Some("1280x720".into());
        assert_ne!(fingerprint(&laptop()), fingerprint(&other));
    }

    #[test]
    fn json_field_order_does_not_matter() {
        let a: DeviceInfo = serde_json::from_str(r#"{"userAgent":"ua","timezone":"UTC","colorDepth":24}"#).unwrap();
        let b: DeviceInfo = serde_json::from_str(r#"{"colorDepth":24,"timezone":"UTC","userAgent":"ua"}"#).unwrap();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn falls_back_to_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static("curl/8.0"));

        let from_headers = resolve(None, &headers);
        let empty = DeviceInfo::default();
        assert_eq!(from_headers, resolve(Some(&empty), &headers));

        let expected = fingerprint(&DeviceInfo {
            user_agent: Some("curl/8.0".into()),
            ..Default::default()
        });
        assert_eq!(from_headers, expected);
    }
}
