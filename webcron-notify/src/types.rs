use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Which transport a payload is shaped for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Direct,
    Relay,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Direct => f.write_str("direct"),
            Protocol::Relay => f.write_str("relay"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "direct" | "mail" => Ok(Protocol::Direct),
            "relay" => Ok(Protocol::Relay),
            other => Err(format!("unknown notification transport '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

/// A rendered notification ready to hand to a transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub subject: String,
    pub body: String,
    pub to: Recipient,
    pub cc: Vec<String>,
    pub protocol: Protocol,
}

impl NotificationPayload {
    /// Primary recipient first, then every cc address not already listed.
    pub fn recipients(&self) -> Vec<String> {
        let mut recipients = Vec::with_capacity(self.cc.len() + 1);
        if !self.to.email.is_empty() {
            recipients.push(self.to.email.clone());
        }
        for email in &self.cc {
            if !recipients.contains(email) {
                recipients.push(email.clone());
            }
        }
        recipients
    }
}

/// Wire shape understood by the notification relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayMessage {
    pub cmdid: String,
    pub title: String,
    pub body: String,
    pub tpl: String,
    #[serde(rename = "toMail")]
    pub to_mail: Vec<Vec<String>>,
}

impl RelayMessage {
    pub fn from_payload(payload: &NotificationPayload) -> Self {
        Self {
            cmdid: "sendmail".into(),
            title: payload.subject.clone(),
            body: payload.body.clone(),
            tpl: "common".into(),
            to_mail: payload
                .recipients()
                .into_iter()
                .map(|email| vec![email])
                .collect(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
