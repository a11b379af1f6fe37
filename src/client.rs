use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{redirect, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::logger::{MessageLogMode, MessageLogger};
use crate::normalize::{
    merge_installation_devices, normalize_alarms, normalize_elements, AlarmsResponse,
    ElementsResponse, InstallationDevicesResponse,
};
use crate::protocol::{
    eco_mode_form, installation_alarms_query, installation_devices_query, is_login_page,
    run_stop_form, setting_temp_form, silent_mode_form, Form, ZoneKind, ELEMENTS_PATH,
    HEAT_SETTING_PATH, LOGIN_PATH,
};
use crate::session::{extract_csrf_input, Session};
use crate::types::*;
use crate::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// The portal serves browsers only; it has no public API surface.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const ACCEPT: &str = "application/json, text/html;q=0.9, */*;q=0.8";
const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

pub struct CsnetClientBuilder {
    base_url: String,
    username: String,
    password: String,
    installation_id: Option<i64>,
    log_mode: Option<MessageLogMode>,
    log_path: Option<String>,
}

impl CsnetClientBuilder {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            installation_id: None,
            log_mode: None,
            log_path: None,
        }
    }

    /// Installation to fetch device metadata and alarms for. Without it,
    /// refresh stops after the elements call.
    pub fn installation_id(mut self, id: i64) -> Self {
        self.installation_id = Some(id);
        self
    }

    pub fn message_log(mut self, mode: MessageLogMode, path: impl Into<String>) -> Self {
        self.log_mode = Some(mode);
        self.log_path = Some(path.into());
        self
    }

    pub fn build(self) -> CsnetClient {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
        headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE),
        );
        headers.insert(
            HeaderName::from_static("x-requested-with"),
            HeaderValue::from_static("XMLHttpRequest"),
        );

        // Redirects are handled by hand: the portal expresses "not logged in"
        // as a redirect to /login, and following it would eat that signal.
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .redirect(redirect::Policy::none())
            .default_headers(headers)
            .build()
            .expect("failed to build HTTP client");

        let logger = match (self.log_mode, self.log_path) {
            (Some(mode), Some(path)) => {
                Some(MessageLogger::new(mode, &path).expect("failed to open log file"))
            }
            _ => None,
        };

        CsnetClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            username: self.username,
            password: self.password,
            installation_id: self.installation_id,
            session: Session::new(),
            records: Vec::new(),
            common: None,
            alarms: Vec::new(),
            logger,
        }
    }
}

pub struct CsnetClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
    installation_id: Option<i64>,
    session: Session,
    records: Vec<SensorRecord>,
    common: Option<CommonData>,
    alarms: Vec<Alarm>,
    logger: Option<MessageLogger>,
}

impl CsnetClient {
    pub fn builder(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> CsnetClientBuilder {
        CsnetClientBuilder::new(base_url, username, password)
    }

    /// Log in to the portal: scrape the login form for the CSRF token, seed
    /// the cookie jar, then post the credentials.
    ///
    /// The portal answers HTTP 200 whether or not the credentials were
    /// accepted; a body that re-renders the login page means failure.
    pub async fn login(&mut self) -> Result<()> {
        let url = format!("{}{}", self.base_url, LOGIN_PATH);
        debug!(url = %url, "logging in to portal");

        if let Some(ref mut logger) = self.logger {
            logger.log_request("GET", LOGIN_PATH);
        }
        let resp = self.http.get(&url).send().await?;
        absorb_cookies(&mut self.session, &resp);
        let body = resp.error_for_status()?.text().await?;

        let token = extract_csrf_input(&body)
            .or_else(|| self.session.cookie("XSRF-TOKEN").map(str::to_string));
        match token {
            Some(token) => self.session.set_csrf_token(token),
            None => warn!("login page carried no CSRF token"),
        }

        let mut form: Form = vec![
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), self.password.clone()),
        ];
        if let Some(token) = self.session.csrf_token() {
            form.push(("_csrf".to_string(), token.to_string()));
        }
        if let Some(ref mut logger) = self.logger {
            logger.log_form("login", None, &form);
        }

        let mut req = self.http.post(&url).form(&form);
        if let Some(cookie) = self.session.cookie_header() {
            req = req.header(header::COOKIE, cookie);
        }
        let resp = req.send().await?;
        absorb_cookies(&mut self.session, &resp);

        let status = resp.status();
        if !status.is_success() && !status.is_redirection() {
            resp.error_for_status_ref()?;
        }
        let body = resp.text().await?;
        if is_login_page(&body) {
            warn!("portal re-rendered the login page, credentials rejected");
            self.session.invalidate();
            return Err(Error::LoginFailed);
        }

        self.session.set_logged_in();
        debug!("login accepted");
        Ok(())
    }

    pub fn logged_in(&self) -> bool {
        self.session.logged_in()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// One poll cycle: elements, then (when an installation id is set)
    /// installation devices and alarms, sequentially. Records and common
    /// data are rebuilt wholesale; nothing from the previous cycle survives.
    pub async fn refresh(&mut self) -> Result<()> {
        let body = self.get_authenticated(ELEMENTS_PATH).await?;
        let parsed: ElementsResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Protocol(format!("elements payload: {e}")))?;
        if parsed.status != 0 {
            return Err(Error::Protocol(format!(
                "elements returned status {}",
                parsed.status
            )));
        }
        let (records, mut common) = normalize_elements(&parsed.data);

        if let Some(installation_id) = self.installation_id {
            let body = self
                .get_authenticated(&installation_devices_query(installation_id))
                .await?;
            let parsed: InstallationDevicesResponse = serde_json::from_str(&body)
                .map_err(|e| Error::Protocol(format!("installation devices payload: {e}")))?;
            merge_installation_devices(&mut common, &parsed.data);

            let token = self.session.csrf_token().unwrap_or_default().to_string();
            let body = self
                .get_authenticated(&installation_alarms_query(installation_id, &token))
                .await?;
            let parsed: AlarmsResponse = serde_json::from_str(&body)
                .map_err(|e| Error::Protocol(format!("alarms payload: {e}")))?;
            self.alarms = normalize_alarms(&parsed.data);
        }

        debug!(records = records.len(), "refresh complete");
        self.records = records;
        self.common = Some(common);
        Ok(())
    }

    pub fn records(&self) -> &[SensorRecord] {
        &self.records
    }

    pub fn record(&self, device_id: i64, zone_id: u8) -> Option<&SensorRecord> {
        self.records
            .iter()
            .find(|r| r.device_id == device_id && r.zone_id == zone_id)
    }

    pub fn common_data(&self) -> Option<&CommonData> {
        self.common.as_ref()
    }

    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }

    // -- Command methods --

    /// Set the target temperature of a zone.
    pub async fn set_temperature(
        &mut self,
        device_id: i64,
        zone_id: u8,
        temperature: f64,
    ) -> Result<()> {
        let zone = ZoneKind::from_zone_id(zone_id)?;
        let form = setting_temp_form(device_id, zone, temperature);
        self.post_heat_setting("set_temperature", zone_id, form).await
    }

    /// Switch a zone on with the given mode, or off with `None`. Off never
    /// sends a mode field; the portal rejects the combination.
    pub async fn set_hvac_mode(
        &mut self,
        device_id: i64,
        zone_id: u8,
        mode: Option<RoomMode>,
    ) -> Result<()> {
        let zone = ZoneKind::from_zone_id(zone_id)?;
        let form = run_stop_form(device_id, zone, mode.is_some(), mode);
        self.post_heat_setting("set_hvac_mode", zone_id, form).await
    }

    pub async fn set_eco_mode(
        &mut self,
        device_id: i64,
        zone_id: u8,
        eco: EcoComfort,
    ) -> Result<()> {
        let zone = ZoneKind::from_zone_id(zone_id)?;
        let form = eco_mode_form(device_id, zone, eco);
        self.post_heat_setting("set_eco_mode", zone_id, form).await
    }

    pub async fn set_silent_mode(
        &mut self,
        device_id: i64,
        zone_id: u8,
        silent: bool,
    ) -> Result<()> {
        let zone = ZoneKind::from_zone_id(zone_id)?;
        let form = silent_mode_form(device_id, zone, silent);
        self.post_heat_setting("set_silent_mode", zone_id, form).await
    }

    // -- Helpers --

    async fn ensure_logged_in(&mut self) -> Result<()> {
        if self.session.logged_in() {
            return Ok(());
        }
        self.login().await
    }

    /// Authenticated GET with one re-login retry. A second rejection after a
    /// fresh login surfaces as `LoginFailed`; the host's poll scheduler owns
    /// any further attempts.
    async fn get_authenticated(&mut self, path_and_query: &str) -> Result<String> {
        self.ensure_logged_in().await?;
        if let Some(body) = self.try_get(path_and_query).await? {
            return Ok(body);
        }

        debug!(path = path_and_query, "portal dropped the session, logging in again");
        self.session.invalidate();
        self.login().await?;
        match self.try_get(path_and_query).await? {
            Some(body) => Ok(body),
            None => {
                self.session.invalidate();
                Err(Error::LoginFailed)
            }
        }
    }

    /// `Ok(None)` means the portal no longer honors the session: it answered
    /// 401/403, redirected, or served the login page instead of data.
    async fn try_get(&mut self, path_and_query: &str) -> Result<Option<String>> {
        let url = format!("{}{}", self.base_url, path_and_query);
        if let Some(ref mut logger) = self.logger {
            logger.log_request("GET", path_and_query);
        }

        let mut req = self.http.get(&url);
        if let Some(cookie) = self.session.cookie_header() {
            req = req.header(header::COOKIE, cookie);
        }
        let resp = req.send().await?;
        absorb_cookies(&mut self.session, &resp);

        let status = resp.status();
        if session_rejected(status) {
            return Ok(None);
        }
        let body = resp.error_for_status()?.text().await?;
        if is_login_page(&body) {
            return Ok(None);
        }

        if let Some(ref mut logger) = self.logger {
            let body_json = serde_json::from_str(&body).unwrap_or(Value::Null);
            logger.log_poll(status.as_u16(), &body_json);
        }
        Ok(Some(body))
    }

    async fn post_heat_setting(&mut self, action: &str, zone_id: u8, form: Form) -> Result<()> {
        self.ensure_logged_in().await?;
        if let Some(ref mut logger) = self.logger {
            logger.log_form(action, Some(zone_id), &form);
        }

        if self.try_post(HEAT_SETTING_PATH, &form).await?.is_some() {
            return Ok(());
        }

        debug!(action, "portal dropped the session on a command, logging in again");
        self.session.invalidate();
        self.login().await?;
        match self.try_post(HEAT_SETTING_PATH, &form).await? {
            Some(_) => Ok(()),
            None => {
                self.session.invalidate();
                Err(Error::LoginFailed)
            }
        }
    }

    async fn try_post(&mut self, path: &str, form: &Form) -> Result<Option<String>> {
        let url = format!("{}{}", self.base_url, path);

        // state-mutating calls carry the CSRF token as a form field
        let mut form = form.clone();
        if let Some(token) = self.session.csrf_token() {
            form.push(("_csrf".to_string(), token.to_string()));
        }

        let mut req = self.http.post(&url).form(&form);
        if let Some(cookie) = self.session.cookie_header() {
            req = req.header(header::COOKIE, cookie);
        }
        let resp = req.send().await?;
        absorb_cookies(&mut self.session, &resp);

        let status = resp.status();
        if session_rejected(status) {
            return Ok(None);
        }
        let body = resp.error_for_status()?.text().await?;
        if is_login_page(&body) {
            return Ok(None);
        }
        Ok(Some(body))
    }
}

fn session_rejected(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || status.is_redirection()
}

fn absorb_cookies(session: &mut Session, resp: &reqwest::Response) {
    for value in resp.headers().get_all(header::SET_COOKIE) {
        if let Ok(value) = value.to_str() {
            session.absorb_set_cookie(value);
        }
    }
}
