use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::warn;

pub enum MessageLogMode {
    /// Log form values and poll bodies. The password field is masked even here.
    Full,
    /// Log form field names and poll status only.
    Redacted,
}

pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self { mode, file })
    }

    pub fn log_request(&mut self, method: &str, path: &str) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "path": path,
        });
        self.write_line(&entry);
    }

    pub fn log_form(&mut self, action: &str, zone_id: Option<u8>, form: &[(String, String)]) {
        let fields: Vec<Value> = form
            .iter()
            .map(|(name, value)| match self.mode {
                MessageLogMode::Full if name == "password" => json!({ "name": name, "value": "***" }),
                MessageLogMode::Full => json!({ "name": name, "value": value }),
                MessageLogMode::Redacted => json!({ "name": name }),
            })
            .collect();
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "cmd",
            "action": action,
            "zone": zone_id,
            "fields": fields,
        });
        self.write_line(&entry);
    }

    pub fn log_poll(&mut self, status: u16, body: &Value) {
        let entry = match self.mode {
            MessageLogMode::Full => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "poll",
                "status": status,
                "body": body,
            }),
            MessageLogMode::Redacted => json!({
                "ts": Utc::now().to_rfc3339(),
                "dir": "poll",
                "status": status,
            }),
        };
        self.write_line(&entry);
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}
