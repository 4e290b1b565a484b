//! Browser-like header profiles.
//!
//! The account service rejects requests that do not look like they come
//! from its own web pages, so every call carries a fixed set of browser
//! headers plus the session cookie.

use crate::error::TransportError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use serde::{Deserialize, Serialize};

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 11; Pixel 5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.91 Mobile Safari/537.36";

/// Which browser the requests pretend to come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderProfile {
    /// Desktop Chrome on the web drive page.
    #[default]
    Desktop,
    /// Android Chrome on the membership growth task page.
    Mobile,
}

impl HeaderProfile {
    pub fn user_agent(self) -> &'static str {
        match self {
            Self::Desktop => DESKTOP_USER_AGENT,
            Self::Mobile => MOBILE_USER_AGENT,
        }
    }

    fn referer_path(self) -> &'static str {
        match self {
            Self::Desktop => "/wap/main",
            Self::Mobile => "/wap/svip/growth/task",
        }
    }

    fn accept_language(self) -> &'static str {
        match self {
            Self::Desktop => "zh-CN,zh;q=0.9",
            Self::Mobile => "zh-CN,zh;q=0.9,en-US;q=0.8,en;q=0.7",
        }
    }

    /// Static header pairs for this profile, names in lowercase. `origin`
    /// is the service root, e.g. `https://pan.baidu.com`.
    pub fn header_pairs(self, origin: &str) -> Vec<(&'static str, String)> {
        let origin = origin.trim_end_matches('/');
        vec![
            ("accept", "application/json, text/plain, */*".to_string()),
            ("user-agent", self.user_agent().to_string()),
            ("x-requested-with", "XMLHttpRequest".to_string()),
            ("sec-fetch-site", "same-origin".to_string()),
            ("sec-fetch-mode", "cors".to_string()),
            ("sec-fetch-dest", "empty".to_string()),
            ("referer", format!("{origin}{}", self.referer_path())),
            ("origin", origin.to_string()),
            ("accept-language", self.accept_language().to_string()),
        ]
    }

    /// Render the profile plus the `Cookie` header into a [`HeaderMap`].
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidRequest`] if the cookie or origin
    /// contains characters that are not valid in a header value. The
    /// message never includes the offending value.
    pub fn to_header_map(self, origin: &str, cookie: &str) -> Result<HeaderMap, TransportError> {
        let mut map = HeaderMap::new();
        for (name, value) in self.header_pairs(origin) {
            let value = HeaderValue::from_str(&value).map_err(|_| {
                TransportError::InvalidRequest(format!("invalid value for header {name}"))
            })?;
            map.insert(HeaderName::from_static(name), value);
        }
        let mut cookie = HeaderValue::from_str(cookie)
            .map_err(|_| TransportError::InvalidRequest("cookie is not a valid header value".into()))?;
        cookie.set_sensitive(true);
        map.insert(COOKIE, cookie);
        Ok(map)
    }
}
