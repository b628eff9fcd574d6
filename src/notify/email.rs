//! SMTP email delivery via `lettre`.

use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::config::MailConfig;
use crate::notify::{Notification, Notifier, NotifyError};

/// Sends notifications as email through the configured SMTP relay.
#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailNotifier {
    /// Build the notifier from the `mail` section of the config.
    ///
    /// Port 465 uses implicit TLS; any other port uses STARTTLS unless
    /// `tls: false` opts out (default port 587). Credentials come from the
    /// config when both username and password are set, otherwise from the
    /// `SMTP_USERNAME`/`SMTP_PASSWORD` environment; with neither, the
    /// connection is unauthenticated.
    pub fn from_config(mail: &MailConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = mail
            .from
            .parse()
            .map_err(|err: lettre::address::AddressError| {
                NotifyError::Config(format!("from address: {err}"))
            })?;

        let to: Vec<Mailbox> = mail
            .to
            .iter()
            .map(|addr| {
                addr.parse().map_err(|err: lettre::address::AddressError| {
                    NotifyError::Config(format!("to address {addr:?}: {err}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if to.is_empty() {
            return Err(NotifyError::Config(
                "at least one recipient is required".to_string(),
            ));
        }

        let host = mail.smtp.host.as_str();
        let port = mail.smtp.port.unwrap_or(587);
        let use_tls = mail.smtp.tls.unwrap_or(true);

        let mut builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|err| NotifyError::Config(err.to_string()))?
                .port(port)
        } else if use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|err| NotifyError::Config(err.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };

        let credentials = match (&mail.smtp.username, &mail.smtp.password) {
            (Some(username), Some(password)) => {
                Some(Credentials::new(username.clone(), password.clone()))
            }
            _ => match (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD")) {
                (Ok(username), Ok(password)) => Some(Credentials::new(username, password)),
                _ => None,
            },
        };
        if let Some(credentials) = credentials {
            builder = builder.credentials(credentials);
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    /// Send a notification email to all configured recipients.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut message = Message::builder().from(self.from.clone());
        for recipient in &self.to {
            message = message.to(recipient.clone());
        }

        let email = message
            .subject(&notification.subject)
            .body(notification.body.clone())
            .map_err(|err| NotifyError::Smtp(err.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|err| NotifyError::Smtp(err.to_string()))?;

        tracing::info!(
            subject = %notification.subject,
            recipients = self.to.len(),
            "email delivered"
        );

        Ok(())
    }
}
