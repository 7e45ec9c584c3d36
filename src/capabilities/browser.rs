//! User-agent heuristics for the default capability detector.
//!
//! Only the major engines are classified:
//!
//! - Chromium derivatives (Chrome, Chromium, headless Chrome, Edge 79+,
//!   Opera, Samsung Internet) by their `Chrome/` version;
//! - legacy EdgeHTML by its `Edge/` version;
//! - Firefox by its `Firefox/` version;
//! - Safari by `Version/`, and any iOS browser by the iOS version since
//!   they all run WebKit;
//! - Internet Explorer, which gets no capabilities at all.
//!
//! Anything else yields an empty set. Parsing is plain token scanning so
//! a hostile header costs a single pass over the string.

use super::{CapabilityDetector, CapabilitySet};

pub const ES2015: &str = "es2015";
pub const ES2016: &str = "es2016";
pub const ES2017: &str = "es2017";
pub const ES2018: &str = "es2018";
pub const PUSH: &str = "push";
pub const SERVICE_WORKER: &str = "serviceworker";
pub const MODULES: &str = "modules";

/// Capability recording the detected browser family.
pub const BROWSER: &str = "browser";
/// Capability recording the detected major version.
pub const BROWSER_VERSION: &str = "browser_version";

/// Browser engine families with distinct capability tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowserFamily {
    Chromium,
    EdgeHtml,
    Firefox,
    Safari,
    InternetExplorer,
}

impl BrowserFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowserFamily::Chromium => "chromium",
            BrowserFamily::EdgeHtml => "edgehtml",
            BrowserFamily::Firefox => "firefox",
            BrowserFamily::Safari => "safari",
            BrowserFamily::InternetExplorer => "ie",
        }
    }

    /// Minimum (major, minor) version per capability. `None` = never.
    fn thresholds(&self) -> &'static [(&'static str, Option<(u32, u32)>)] {
        match self {
            BrowserFamily::Chromium => &[
                (ES2015, Some((49, 0))),
                (ES2016, Some((58, 0))),
                (ES2017, Some((58, 0))),
                (ES2018, Some((64, 0))),
                (PUSH, Some((41, 0))),
                (SERVICE_WORKER, Some((45, 0))),
                (MODULES, Some((61, 0))),
            ],
            BrowserFamily::EdgeHtml => &[
                (ES2015, Some((15, 0))),
                (ES2016, Some((15, 0))),
                (ES2017, Some((15, 0))),
                (ES2018, None),
                (PUSH, Some((12, 0))),
                (SERVICE_WORKER, Some((17, 0))),
                (MODULES, Some((16, 0))),
            ],
            BrowserFamily::Firefox => &[
                (ES2015, Some((51, 0))),
                (ES2016, Some((52, 0))),
                (ES2017, Some((52, 0))),
                (ES2018, Some((58, 0))),
                (PUSH, Some((36, 0))),
                (SERVICE_WORKER, Some((44, 0))),
                (MODULES, Some((60, 0))),
            ],
            // 10.1 shipped modules without `nomodule`, so it would run both bundles.
            BrowserFamily::Safari => &[
                (ES2015, Some((10, 0))),
                (ES2016, Some((10, 1))),
                (ES2017, Some((10, 1))),
                (ES2018, Some((11, 1))),
                (PUSH, Some((9, 0))),
                (SERVICE_WORKER, Some((11, 1))),
                (MODULES, Some((11, 0))),
            ],
            BrowserFamily::InternetExplorer => &[],
        }
    }
}

/// A classified user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserInfo {
    pub family: BrowserFamily,
    pub version: (u32, u32),
}

/// Parse the browser family and version from a user-agent string.
pub fn parse_user_agent(ua: &str) -> Option<BrowserInfo> {
    if ua.contains("Trident/") || ua.contains("MSIE ") {
        return Some(BrowserInfo {
            family: BrowserFamily::InternetExplorer,
            version: (0, 0),
        });
    }

    let ios = ua.contains("iPhone") || ua.contains("iPad") || ua.contains("iPod");
    if ios {
        // Every iOS browser is WebKit; the OS version bounds the engine.
        let version = token_version(ua, "Version/").or_else(|| ios_version(ua))?;
        return Some(BrowserInfo {
            family: BrowserFamily::Safari,
            version,
        });
    }

    if let Some(version) = token_version(ua, "Edge/") {
        return Some(BrowserInfo {
            family: BrowserFamily::EdgeHtml,
            version,
        });
    }

    let chromium = token_version(ua, "Chrome/")
        .or_else(|| token_version(ua, "Chromium/"))
        .or_else(|| token_version(ua, "HeadlessChrome/"));
    if let Some(version) = chromium {
        return Some(BrowserInfo {
            family: BrowserFamily::Chromium,
            version,
        });
    }

    if let Some(version) = token_version(ua, "Firefox/") {
        return Some(BrowserInfo {
            family: BrowserFamily::Firefox,
            version,
        });
    }

    if ua.contains("Safari/") {
        if let Some(version) = token_version(ua, "Version/") {
            return Some(BrowserInfo {
                family: BrowserFamily::Safari,
                version,
            });
        }
    }

    None
}

/// Version following `token`, e.g. `Chrome/120.0.1` → (120, 0).
fn token_version(ua: &str, token: &str) -> Option<(u32, u32)> {
    let start = ua.find(token)? + token.len();
    parse_version(&ua[start..], '.')
}

/// iOS version from the platform section, e.g. `CPU iPhone OS 16_5 like Mac OS X`.
fn ios_version(ua: &str) -> Option<(u32, u32)> {
    let start = ua.find(" OS ")? + " OS ".len();
    parse_version(&ua[start..], '_')
}

fn parse_version(s: &str, separator: char) -> Option<(u32, u32)> {
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == separator))
        .unwrap_or(s.len());
    let mut parts = s[..end].split(separator);
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
    Some((major, minor))
}

/// Default detector: classifies the user agent and derives capability
/// flags from per-family minimum versions.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserCapabilities;

impl BrowserCapabilities {
    pub fn new() -> Self {
        Self
    }
}

impl CapabilityDetector for BrowserCapabilities {
    fn detect(&self, user_agent: &str) -> CapabilitySet {
        let Some(info) = parse_user_agent(user_agent) else {
            return CapabilitySet::new();
        };

        let mut caps = CapabilitySet::new()
            .with(BROWSER, info.family.as_str())
            .with(BROWSER_VERSION, f64::from(info.version.0));

        for (name, since) in info.family.thresholds() {
            if since.is_some_and(|min| info.version >= min) {
                caps = caps.with(*name, true);
            }
        }
        caps
    }
}
