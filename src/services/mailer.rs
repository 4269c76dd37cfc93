use anyhow::{Context, Result};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::core::config::Settings;

#[derive(Debug, Clone)]
pub(crate) struct OutgoingMail {
    pub(crate) to: String,
    pub(crate) subject: String,
    pub(crate) body: String,
}

/// SMTP sender. When email is disabled every send is logged and dropped.
#[derive(Clone)]
pub(crate) struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Option<Mailbox>,
}

impl Mailer {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let email = settings.email();
        if !email.is_configured() {
            return Ok(Self { transport: None, from: None });
        }

        let from: Mailbox = email.from_address.parse().context("Invalid SMTP_FROM address")?;

        let builder = if email.smtp_tls {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&email.smtp_host)
                .context("Failed to create SMTP relay")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&email.smtp_host)
        };

        let mut builder = builder.port(email.smtp_port);
        if !email.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                email.smtp_username.clone(),
                email.smtp_password.clone(),
            ));
        }

        Ok(Self { transport: Some(builder.build()), from: Some(from) })
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.transport.is_some()
    }

    pub(crate) async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let (Some(transport), Some(from)) = (&self.transport, &self.from) else {
            tracing::info!(to = %mail.to, subject = %mail.subject, "Email disabled; message dropped");
            return Ok(());
        };

        let to: Mailbox = mail.to.parse().context("Invalid recipient address")?;
        let message = Message::builder()
            .from(from.clone())
            .to(to)
            .subject(mail.subject)
            .body(mail.body)
            .context("Failed to build email")?;

        transport.send(message).await.context("Failed to send email")?;
        Ok(())
    }

    /// Sends on a detached task. Failures are logged and never reach the caller.
    pub(crate) fn dispatch(&self, mail: OutgoingMail) {
        let mailer = self.clone();
        tokio::spawn(async move {
            let to = mail.to.clone();
            match mailer.send(mail).await {
                Ok(()) => tracing::debug!(to = %to, "Email dispatched"),
                Err(err) => tracing::warn!(to = %to, error = %err, "Failed to send email"),
            }
        });
    }
}

pub(crate) fn otp_mail(to: &str, otp: &str) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: "Your password reset code".to_string(),
        body: format!(
            "Your one-time password reset code is {otp}.\n\nIt expires in 10 minutes. \
             If you did not request a reset you can ignore this email."
        ),
    }
}

pub(crate) fn certificate_share_mail(
    to: &str,
    holder: &str,
    title: &str,
    verification_url: &str,
) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: format!("{holder} shared a certificate with you"),
        body: format!(
            "{holder} earned the certificate \"{title}\".\n\nVerify it here: {verification_url}"
        ),
    }
}

pub(crate) fn payment_confirmation_mail(
    to: &str,
    item_title: &str,
    receipt_number: &str,
    amount: &str,
) -> OutgoingMail {
    OutgoingMail {
        to: to.to_string(),
        subject: format!("Payment received: {item_title}"),
        body: format!(
            "We received your payment of INR {amount} for {item_title}.\n\
             Receipt number: {receipt_number}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn disabled_mailer_drops_messages() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let settings = Settings::load().expect("settings");

        let mailer = Mailer::from_settings(&settings).expect("mailer");
        assert!(!mailer.is_enabled());
        mailer.send(otp_mail("student@example.com", "123456")).await.expect("dropped");
    }

    #[test]
    fn otp_mail_mentions_code_and_expiry() {
        let mail = otp_mail("student@example.com", "654321");
        assert_eq!(mail.to, "student@example.com");
        assert!(mail.body.contains("654321"));
        assert!(mail.body.contains("10 minutes"));
    }
}
