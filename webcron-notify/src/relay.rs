use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::{io::AsyncWriteExt, net::TcpStream, time};

use crate::errors::NotifyError;

/// Notification relay collaborator accepting an already serialized message.
#[async_trait]
pub trait RelayClient: Send + Sync + 'static {
    async fn send_notification(&self, message: &str) -> Result<(), NotifyError>;
}

/// Relay client writing one newline-terminated JSON message per connection.
#[derive(Debug, Clone)]
pub struct TcpRelayClient {
    address: String,
    timeout: Duration,
}

impl TcpRelayClient {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    fn io_error(&self, source: std::io::Error) -> NotifyError {
        NotifyError::RelayIo {
            address: self.address.clone(),
            source,
        }
    }
}

#[async_trait]
impl RelayClient for TcpRelayClient {
    async fn send_notification(&self, message: &str) -> Result<(), NotifyError> {
        let mut stream = time::timeout(self.timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| NotifyError::RelayTimeout {
                address: self.address.clone(),
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|err| self.io_error(err))?;

        stream
            .write_all(message.as_bytes())
            .await
            .map_err(|err| self.io_error(err))?;
        stream
            .write_all(b"\n")
            .await
            .map_err(|err| self.io_error(err))?;
        stream.shutdown().await.map_err(|err| self.io_error(err))?;

        debug!("Relayed {} bytes to {}", message.len(), self.address);
        Ok(())
    }
}
