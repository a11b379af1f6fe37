use std::collections::BTreeMap;

use tracing::trace;

/// Cookie and CSRF state for one portal login.
///
/// Owned by the client, single writer. Invalidated and rebuilt from scratch
/// whenever the portal stops honoring the cookies.
#[derive(Debug, Default)]
pub struct Session {
    logged_in: bool,
    csrf_token: Option<String>,
    cookies: BTreeMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn logged_in(&self) -> bool {
        self.logged_in
    }

    pub(crate) fn set_logged_in(&mut self) {
        self.logged_in = true;
    }

    /// Drop everything the portal handed out. The next authenticated call
    /// has to start from a fresh login.
    pub(crate) fn invalidate(&mut self) {
        trace!("invalidating session");
        self.logged_in = false;
        self.csrf_token = None;
        self.cookies.clear();
    }

    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub(crate) fn set_csrf_token(&mut self, token: impl Into<String>) {
        self.csrf_token = Some(token.into());
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Store one `Set-Cookie` header value. Attributes after the first `;`
    /// are dropped; the latest value per name wins.
    pub(crate) fn absorb_set_cookie(&mut self, header: &str) {
        let pair = header.split(';').next().unwrap_or("");
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        trace!(cookie = name, "absorbing cookie");
        self.cookies.insert(name.to_string(), value.trim().to_string());
    }

    /// Render the jar as a single `Cookie` request header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let rendered = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        Some(rendered)
    }
}

/// Scrape the CSRF token out of the login form:
/// `<input type="hidden" name="_csrf" value="...">`.
pub(crate) fn extract_csrf_input(body: &str) -> Option<String> {
    let input_start = body.find("name=\"_csrf\"")?;
    let rest = &body[input_start..];
    // the value attribute follows within the same tag
    let tag_end = rest.find('>')?;
    let tag = &rest[..tag_end];
    let value_start = tag.find("value=\"")? + "value=\"".len();
    let value_end = tag[value_start..].find('"')?;
    let token = &tag[value_start..value_start + value_end];
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
