use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Url};
use serde::Serialize;

use crate::errors::NotifyError;

/// Mail delivery collaborator. Reports success as a plain flag.
#[async_trait]
pub trait MailSender: Send + Sync + 'static {
    async fn send(
        &self,
        to: &str,
        to_name: &str,
        subject: &str,
        html_body: &str,
        cc: &[String],
    ) -> bool;
}

#[derive(Debug, Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    to: &'a str,
    to_name: &'a str,
    subject: &'a str,
    html: &'a str,
    cc: &'a [String],
}

/// Sends mail by posting it to an HTTP mail gateway.
#[derive(Clone)]
pub struct HttpMailSender {
    client: Client,
    endpoint: Url,
    from: String,
}

impl HttpMailSender {
    pub fn new(endpoint: &str, from: impl Into<String>) -> Result<Self, NotifyError> {
        let client = Client::builder().build()?;
        Self::with_client(endpoint, from, client)
    }

    pub fn with_client(
        endpoint: &str,
        from: impl Into<String>,
        client: Client,
    ) -> Result<Self, NotifyError> {
        let endpoint = Url::parse(endpoint).map_err(|source| NotifyError::InvalidEndpoint {
            url: endpoint.to_string(),
            source,
        })?;
        Ok(Self {
            client,
            endpoint,
            from: from.into(),
        })
    }
}

#[async_trait]
impl MailSender for HttpMailSender {
    async fn send(
        &self,
        to: &str,
        to_name: &str,
        subject: &str,
        html_body: &str,
        cc: &[String],
    ) -> bool {
        let request = MailRequest {
            from: &self.from,
            to,
            to_name,
            subject,
            html: html_body,
            cc,
        };

        match self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!("Mail gateway accepted message to {}", to);
                true
            }
            Ok(response) => {
                warn!(
                    "Mail gateway {} returned {} for message to {}",
                    self.endpoint,
                    response.status(),
                    to
                );
                false
            }
            Err(err) => {
                warn!("Mail gateway {} unreachable: {}", self.endpoint, err);
                false
            }
        }
    }
}
