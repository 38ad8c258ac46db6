use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    errors::NotifyError,
    mail::MailSender,
    relay::RelayClient,
    types::{NotificationPayload, Protocol, RelayMessage},
};

/// Delivery strategy for rendered notifications, chosen once at startup.
#[async_trait]
pub trait NotificationTransport: Send + Sync + 'static {
    fn protocol(&self) -> Protocol;

    /// Hand the payload over once. No retry is attempted on failure.
    async fn deliver(&self, payload: &NotificationPayload) -> Result<(), NotifyError>;
}

/// Sends the mail itself through a [`MailSender`].
pub struct DirectTransport {
    sender: Arc<dyn MailSender>,
}

impl DirectTransport {
    pub fn new(sender: Arc<dyn MailSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl NotificationTransport for DirectTransport {
    fn protocol(&self) -> Protocol {
        Protocol::Direct
    }

    async fn deliver(&self, payload: &NotificationPayload) -> Result<(), NotifyError> {
        let delivered = self
            .sender
            .send(
                &payload.to.email,
                &payload.to.name,
                &payload.subject,
                &payload.body,
                &payload.cc,
            )
            .await;
        if delivered {
            Ok(())
        } else {
            Err(NotifyError::MailRejected {
                to: payload.to.email.clone(),
            })
        }
    }
}

/// Serializes the payload into a [`RelayMessage`] and passes it to a relay.
pub struct RelayTransport {
    client: Arc<dyn RelayClient>,
}

impl RelayTransport {
    pub fn new(client: Arc<dyn RelayClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationTransport for RelayTransport {
    fn protocol(&self) -> Protocol {
        Protocol::Relay
    }

    async fn deliver(&self, payload: &NotificationPayload) -> Result<(), NotifyError> {
        let message = RelayMessage::from_payload(payload).to_json()?;
        self.client.send_notification(&message).await
    }
}
