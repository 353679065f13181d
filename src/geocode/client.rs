//! HTTP client shared by all geocoding backends.
//!
//! One explicitly constructed `ureq::Agent` is reused across calls so
//! connection state lives in a value the resolver owns, not in a
//! process-wide global.

use super::types::GeocodeError;
use std::time::Duration;

const USER_AGENT_BASE: &str = concat!("addr2yandex/", env!("CARGO_PKG_VERSION"));

/// Build the identifying `User-Agent`. Nominatim's usage policy asks
/// for a contact address, so an email (usually from `NOMINATIM_EMAIL`)
/// is appended when it looks plausible.
fn user_agent(email: Option<&str>) -> String {
    let mail = email.unwrap_or("").trim();
    if !mail.is_empty() && !mail.contains(' ') {
        format!("{} ({})", USER_AGENT_BASE, mail)
    } else {
        USER_AGENT_BASE.to_string()
    }
}

/// Blocking JSON fetcher with a fixed identity.
pub struct GeoClient {
    agent: ureq::Agent,
    user_agent: String,
}

impl GeoClient {
    pub fn new(nominatim_email: Option<&str>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            user_agent: user_agent(nominatim_email),
        }
    }

    /// Issue a GET and parse the body as JSON. `extra_headers` are
    /// `(name, value)` pairs; empty values are skipped.
    pub fn fetch_json(
        &self,
        url: &str,
        extra_headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<serde_json::Value, GeocodeError> {
        let mut req = self
            .agent
            .get(url)
            .timeout(timeout)
            .set("User-Agent", &self.user_agent)
            .set("Accept", "application/json");
        for (name, value) in extra_headers {
            if !value.is_empty() {
                req = req.set(name, value);
            }
        }
        let response = req.call().map_err(|e| GeocodeError::Network(e.to_string()))?;
        response
            .into_json()
            .map_err(|e| GeocodeError::InvalidResponse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_bare() {
        assert_eq!(user_agent(None), USER_AGENT_BASE);
        assert_eq!(user_agent(Some("")), USER_AGENT_BASE);
        assert_eq!(user_agent(Some("   ")), USER_AGENT_BASE);
    }

    #[test]
    fn test_user_agent_with_email() {
        assert_eq!(
            user_agent(Some("ops@example.com")),
            format!("{} (ops@example.com)", USER_AGENT_BASE)
        );
    }

    #[test]
    fn test_user_agent_rejects_spaces() {
        assert_eq!(user_agent(Some("not an email")), USER_AGENT_BASE);
    }
}
