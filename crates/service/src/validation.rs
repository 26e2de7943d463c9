//! Validated request shapes shared by the menu, category and item services.
//!
//! Values are checked once, when constructed, so services only ever see
//! well-formed input.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Encoded payload ceiling, roughly 10 MiB of image bytes.
pub const MAX_IMAGE_BASE64_LEN: usize = 14 * 1024 * 1024;

/// Trimmed display name of a menu, category or item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayName(String);

impl DisplayName {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        Ok(Self(models::menu::validate_display_name(raw)?))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

/// Base64 image body, with any `data:<mime>;base64,` prefix removed.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload(String);

impl std::fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ImagePayload({} chars)", self.0.len())
    }
}

impl ImagePayload {
    pub fn parse(raw: &str) -> Result<Self, ServiceError> {
        let raw = raw.trim();
        let body = match raw.strip_prefix("data:") {
            Some(rest) => rest
                .split_once(";base64,")
                .map(|(_, b)| b)
                .ok_or_else(|| ServiceError::Validation("image data url must be base64".into()))?,
            None => raw,
        };
        if body.is_empty() {
            return Err(ServiceError::Validation("image payload is empty".into()));
        }
        if body.len() > MAX_IMAGE_BASE64_LEN {
            return Err(ServiceError::Validation("image payload too large".into()));
        }
        STANDARD
            .decode(body)
            .map_err(|e| ServiceError::Validation(format!("image payload is not base64: {e}")))?;
        Ok(Self(body.to_string()))
    }

    /// Optional field helper: `None` and blank strings mean "no image".
    pub fn parse_optional(raw: Option<&str>) -> Result<Option<Self>, ServiceError> {
        match raw {
            Some(s) if !s.trim().is_empty() => Self::parse(s).map(Some),
            _ => Ok(None),
        }
    }

    pub fn as_base64(&self) -> &str { &self.0 }
}

pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Optional free text: trimmed, blank becomes `None`.
pub fn parse_description(raw: Option<&str>) -> Result<Option<String>, ServiceError> {
    let Some(text) = raw.map(str::trim).filter(|t| !t.is_empty()) else { return Ok(None) };
    if text.chars().count() > DESCRIPTION_MAX_CHARS {
        return Err(ServiceError::Validation(format!("description too long (<={DESCRIPTION_MAX_CHARS})")));
    }
    Ok(Some(text.to_string()))
}

pub fn parse_price(price: i64) -> Result<i64, ServiceError> {
    models::menu_item::validate_price(price)?;
    Ok(price)
}

/// One `{id, newPosition}` entry of a reorder request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    pub id: Uuid,
    pub new_position: i32,
}

/// Non-empty list of position reassignments. Contiguity and uniqueness of the
/// resulting positions are the caller's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reorder(Vec<PositionUpdate>);

impl Reorder {
    pub fn new(updates: Vec<PositionUpdate>) -> Result<Self, ServiceError> {
        if updates.is_empty() {
            return Err(ServiceError::Validation("at least one position update required".into()));
        }
        if let Some(bad) = updates.iter().find(|u| u.new_position < 0) {
            return Err(ServiceError::Validation(format!("newPosition must be >= 0 (id {})", bad.id)));
        }
        Ok(Self(updates))
    }

    pub fn updates(&self) -> &[PositionUpdate] { &self.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_trims_and_bounds() {
        assert_eq!(DisplayName::parse(" Soups ").unwrap().as_str(), "Soups");
        assert!(DisplayName::parse("").unwrap_err().is_validation());
        assert!(DisplayName::parse(&"a".repeat(101)).is_err());
    }

    #[test]
    fn image_payload_accepts_plain_and_data_url() {
        let plain = ImagePayload::parse("aGVsbG8=").unwrap();
        assert_eq!(plain.as_base64(), "aGVsbG8=");
        let url = ImagePayload::parse("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(url.as_base64(), "aGVsbG8=");
    }

    #[test]
    fn image_payload_rejects_garbage() {
        assert!(ImagePayload::parse("data:image/png,hello").is_err());
        assert!(ImagePayload::parse("data:image/png;base64,").is_err());
        assert!(ImagePayload::parse("not base64 !!").is_err());
    }

    #[test]
    fn blank_optional_image_is_none() {
        assert!(ImagePayload::parse_optional(None).unwrap().is_none());
        assert!(ImagePayload::parse_optional(Some("  ")).unwrap().is_none());
        assert!(ImagePayload::parse_optional(Some("aGk=")).unwrap().is_some());
    }

    #[test]
    fn description_and_price() {
        assert_eq!(parse_description(Some("  ")).unwrap(), None);
        assert_eq!(parse_description(Some(" spicy ")).unwrap().as_deref(), Some("spicy"));
        assert!(parse_description(Some(&"x".repeat(501))).is_err());
        assert!(parse_price(-5).unwrap_err().is_validation());
        assert_eq!(parse_price(0).unwrap(), 0);
    }

    #[test]
    fn reorder_rules() {
        assert!(Reorder::new(vec![]).is_err());
        let id = Uuid::new_v4();
        assert!(Reorder::new(vec![PositionUpdate { id, new_position: -1 }]).is_err());
        let r = Reorder::new(vec![PositionUpdate { id, new_position: 3 }]).unwrap();
        assert_eq!(r.updates()[0].new_position, 3);
    }

    #[test]
    fn position_update_uses_camel_case() {
        let id = Uuid::nil();
        let parsed: PositionUpdate = serde_json::from_value(serde_json::json!({"id": id, "newPosition": 2})).unwrap();
        assert_eq!(parsed, PositionUpdate { id, new_position: 2 });
    }
}
