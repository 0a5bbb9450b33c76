// Outbound notifications: request composition and delivery

mod composer;
mod sender;

pub use composer::{capitalize, Composer};
pub use sender::{HttpSender, NotificationSender};

use reqwest::Method;
use serde_json::Value;
use std::fmt;

/// Delivery target of a composed request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Channel {
    Ntfy,
    HomeAssistant { entity_id: String },
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Ntfy => write!(f, "ntfy"),
            Channel::HomeAssistant { entity_id } => write!(f, "Home Assistant ({})", entity_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Text(String),
    Json(Value),
}

/// Fully specified outbound HTTP call. Building one never performs I/O.
#[derive(Clone, Debug, PartialEq)]
pub struct NotificationRequest {
    pub channel: Channel,
    pub method: Method,
    pub url: String,
    /// Header name/value pairs, in send order
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl NotificationRequest {
    /// Look up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}
