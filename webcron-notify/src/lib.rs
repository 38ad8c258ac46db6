mod errors;
pub mod mail;
pub mod relay;
pub mod template;
pub mod transport;
mod types;

pub use errors::NotifyError;
pub use mail::{HttpMailSender, MailSender};
pub use relay::{RelayClient, TcpRelayClient};
pub use template::NotificationContext;
pub use transport::{DirectTransport, NotificationTransport, RelayTransport};
pub use types::{NotificationPayload, Protocol, Recipient, RelayMessage};
