use crate::config::MailSection;
use crate::domain::model::OutboundMail;
use crate::domain::ports::MailTransport;
use crate::utils::error::{MonitorError, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// SMTP 寄信轉接層：STARTTLS + 帳密驗證，寄件人與收件人清單固定於設定。
/// 連線、驗證、寄送的任何失敗都折成 `NotificationError` 交給上層記錄。
#[derive(Debug)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
}

impl SmtpMailer {
    pub fn new(config: &MailSection, port: u16) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| MonitorError::NotificationError {
                message: format!("SMTP relay setup failed: {}", e),
            })?
            .port(port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        let from = parse_mailbox("mail.from", &config.from)?;
        let recipients = config
            .recipients
            .iter()
            .map(|addr| parse_mailbox("mail.recipients", addr))
            .collect::<Result<Vec<Mailbox>>>()?;

        Ok(Self {
            transport,
            from,
            recipients,
        })
    }
}

fn parse_mailbox(field: &str, raw: &str) -> Result<Mailbox> {
    raw.parse::<Mailbox>()
        .map_err(|e| MonitorError::NotificationError {
            message: format!("{} has an invalid mailbox \"{}\": {}", field, raw, e),
        })
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, mail: OutboundMail) -> Result<()> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_PLAIN);
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }

        let message = builder
            .body(mail.body)
            .map_err(|e| MonitorError::NotificationError {
                message: format!("failed to build the mail message: {}", e),
            })?;

        tracing::debug!("📧 Sending \"{}\"", mail.subject);
        self.transport
            .send(message)
            .await
            .map_err(|e| MonitorError::NotificationError {
                message: format!("SMTP send failed: {}", e),
            })?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mail_section(from: &str, recipients: Vec<&str>) -> MailSection {
        MailSection {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: None,
            username: "watcher@example.net".to_string(),
            password: "hunter2".to_string(),
            from: from.to_string(),
            recipients: recipients.into_iter().map(str::to_string).collect(),
        }
    }

    #[test]
    fn test_mailer_accepts_display_name_mailboxes() {
        let config = mail_section(
            "Slot Checker <watcher@example.net>",
            vec!["One <one@example.org>", "two@example.org"],
        );

        assert!(SmtpMailer::new(&config, 587).is_ok());
    }

    #[test]
    fn test_invalid_from_address_is_a_notification_error() {
        let config = mail_section("not an address", vec!["one@example.org"]);

        let err = SmtpMailer::new(&config, 587).unwrap_err();

        assert!(matches!(err, MonitorError::NotificationError { .. }));
    }

    #[test]
    fn test_invalid_recipient_is_a_notification_error() {
        let config = mail_section("watcher@example.net", vec!["<<broken"]);

        let err = SmtpMailer::new(&config, 587).unwrap_err();

        assert!(matches!(err, MonitorError::NotificationError { .. }));
    }
}
