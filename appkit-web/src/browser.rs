//! Modern-browser gate
//!
//! Requests from known browsers older than the configured minimum receive
//! `406 Not Acceptable`. Requests without a User-Agent, from unrecognised
//! clients (bots, curl, API consumers), or with a version that cannot be
//! parsed are let through.

use std::collections::HashMap;
use std::fmt;

use axum::{
    extract::{Request, State},
    http::{header::USER_AGENT, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::info;

use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Browser {
    Chrome,
    Edge,
    Firefox,
    Safari,
    Opera,
    InternetExplorer,
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Browser::Chrome => "Chrome",
            Browser::Edge => "Edge",
            Browser::Firefox => "Firefox",
            Browser::Safari => "Safari",
            Browser::Opera => "Opera",
            Browser::InternetExplorer => "Internet Explorer",
        };
        f.write_str(name)
    }
}

/// Major.minor browser version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
}

impl Version {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse the leading `major[.minor]` of a version token like `120.0.6099.109`
    fn parse_leading(token: &str) -> Option<Self> {
        let end = token
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(token.len());
        let mut parts = token[..end].split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts
            .next()
            .and_then(|m| m.parse().ok())
            .unwrap_or(0);
        Some(Self { major, minor })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Identify the browser and version from a User-Agent string
///
/// Order matters: Edge and Opera also advertise Chrome, and Chrome also
/// advertises Safari.
pub fn detect(user_agent: &str) -> Option<(Browser, Version)> {
    let after = |marker: &str| {
        user_agent
            .find(marker)
            .map(|idx| &user_agent[idx + marker.len()..])
    };

    if let Some(rest) = after("MSIE ") {
        return Version::parse_leading(rest).map(|v| (Browser::InternetExplorer, v));
    }
    if user_agent.contains("Trident/") {
        let version = after("rv:").and_then(Version::parse_leading)?;
        return Some((Browser::InternetExplorer, version));
    }
    if let Some(rest) = after("OPR/") {
        return Version::parse_leading(rest).map(|v| (Browser::Opera, v));
    }
    if let Some(rest) = after("Edg/").or_else(|| after("Edge/")) {
        return Version::parse_leading(rest).map(|v| (Browser::Edge, v));
    }
    if let Some(rest) = after("Firefox/").or_else(|| after("FxiOS/")) {
        return Version::parse_leading(rest).map(|v| (Browser::Firefox, v));
    }
    if let Some(rest) = after("Chrome/").or_else(|| after("CriOS/")) {
        return Version::parse_leading(rest).map(|v| (Browser::Chrome, v));
    }
    if user_agent.contains("Safari/") {
        if let Some(rest) = after("Version/") {
            return Version::parse_leading(rest).map(|v| (Browser::Safari, v));
        }
    }
    None
}

/// Minimum supported version per browser; `None` blocks a browser outright
#[derive(Debug, Clone, Default)]
pub struct BrowserPolicy {
    minimums: HashMap<Browser, Option<Version>>,
}

impl BrowserPolicy {
    /// Every browser allowed
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Browsers with webp, web push, badges, import maps, CSS nesting and `:has`
    pub fn modern() -> Self {
        Self::allow_all()
            .require(Browser::Safari, Version::new(17, 2))
            .require(Browser::Chrome, Version::new(120, 0))
            .require(Browser::Edge, Version::new(120, 0))
            .require(Browser::Firefox, Version::new(121, 0))
            .require(Browser::Opera, Version::new(106, 0))
            .block(Browser::InternetExplorer)
    }

    pub fn require(mut self, browser: Browser, minimum: Version) -> Self {
        self.minimums.insert(browser, Some(minimum));
        self
    }

    pub fn block(mut self, browser: Browser) -> Self {
        self.minimums.insert(browser, None);
        self
    }

    pub fn allows(&self, user_agent: Option<&str>) -> bool {
        let Some((browser, version)) = user_agent.and_then(detect) else {
            return true;
        };
        match self.minimums.get(&browser) {
            None => true,
            Some(None) => false,
            Some(Some(minimum)) => version >= *minimum,
        }
    }
}

/// Reject outdated browsers before the handler runs
pub async fn browser_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let user_agent = request
        .headers()
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok());

    if state.browser_policy.allows(user_agent) {
        return next.run(request).await;
    }

    if let Some((browser, version)) = user_agent.and_then(detect) {
        info!("Blocked unsupported browser {} {}", browser, version);
    }

    (StatusCode::NOT_ACCEPTABLE, state.i18n.t("browser.unsupported")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_120: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.6099.109 Safari/537.36";
    const CHROME_90: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.93 Safari/537.36";
    const EDGE_119: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0.0.0 Safari/537.36 Edg/119.0.2151.97";
    const FIREFOX_121: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const FIREFOX_115: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:115.0) Gecko/20100101 Firefox/115.0";
    const SAFARI_17_1: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15";
    const SAFARI_17_2: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2.1 Safari/605.1.15";
    const OPERA_106: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 OPR/106.0.0.0";
    const IE_11: &str = "Mozilla/5.0 (Windows NT 10.0; Trident/7.0; rv:11.0) like Gecko";

    #[test]
    fn test_detect_browsers() {
        assert_eq!(detect(CHROME_120), Some((Browser::Chrome, Version::new(120, 0))));
        assert_eq!(detect(EDGE_119), Some((Browser::Edge, Version::new(119, 0))));
        assert_eq!(detect(FIREFOX_121), Some((Browser::Firefox, Version::new(121, 0))));
        assert_eq!(detect(SAFARI_17_2), Some((Browser::Safari, Version::new(17, 2))));
        assert_eq!(detect(OPERA_106), Some((Browser::Opera, Version::new(106, 0))));
        assert_eq!(detect(IE_11), Some((Browser::InternetExplorer, Version::new(11, 0))));
        assert_eq!(detect("curl/8.4.0"), None);
    }

    #[test]
    fn test_modern_policy_thresholds() {
        let policy = BrowserPolicy::modern();

        assert!(policy.allows(Some(CHROME_120)));
        assert!(policy.allows(Some(FIREFOX_121)));
        assert!(policy.allows(Some(SAFARI_17_2)));
        assert!(policy.allows(Some(OPERA_106)));

        assert!(!policy.allows(Some(CHROME_90)));
        assert!(!policy.allows(Some(EDGE_119)));
        assert!(!policy.allows(Some(FIREFOX_115)));
        assert!(!policy.allows(Some(SAFARI_17_1)));
        assert!(!policy.allows(Some(IE_11)));
    }

    #[test]
    fn test_unknown_or_missing_user_agent_allowed() {
        let policy = BrowserPolicy::modern();
        assert!(policy.allows(None));
        assert!(policy.allows(Some("")));
        assert!(policy.allows(Some("curl/8.4.0")));
        assert!(policy.allows(Some("Mozilla/5.0 Chrome/abc")));
    }

    #[test]
    fn test_allow_all_policy() {
        let policy = BrowserPolicy::allow_all();
        assert!(policy.allows(Some(IE_11)));
        assert!(policy.allows(Some(CHROME_90)));
    }
}
