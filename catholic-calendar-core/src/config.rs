//! Feed-level options.

use serde::{Deserialize, Serialize};

pub const DEFAULT_NAME: &str = "General Roman Calendar";
pub const DEFAULT_PRODID: &str = "-//Catholic Calendar//General Roman Calendar//EN";
pub const DEFAULT_DOMAIN: &str = "catholic.calendar";
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Options that control how the generated feed looks.
///
/// `method`, `refresh_interval` and `published_ttl` are only emitted when
/// set to a non-empty value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Display name (X-WR-CALNAME)
    pub name: String,
    pub prodid: String,
    /// Domain appended to event UIDs
    pub domain: String,
    /// Timezone identifier (X-WR-TIMEZONE)
    pub timezone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_ttl: Option<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            name: DEFAULT_NAME.to_string(),
            prodid: DEFAULT_PRODID.to_string(),
            domain: DEFAULT_DOMAIN.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            method: None,
            refresh_interval: None,
            published_ttl: None,
        }
    }
}

impl FeedConfig {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }
}

/// Trim an optional setting; empty or `none` (any case) disables it.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    let stripped = value?.trim();
    if stripped.is_empty() || stripped.eq_ignore_ascii_case("none") {
        return None;
    }
    Some(stripped.to_string())
}
