use crate::config::email::{frontend_url, EmailConfig};
use anyhow::Result;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Option<String>,
    frontend_url: String,
}

impl EmailService {
    /// A service that logs and skips every send.
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from_address: None,
            frontend_url: frontend_url(),
        }
    }

    /// Build from environment variables. Without SMTP settings mails are skipped.
    pub fn from_env() -> Self {
        let Some(cfg) = EmailConfig::from_env() else {
            return Self::disabled();
        };

        let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
        match AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host)
            .map(|builder| builder.port(cfg.smtp_port).credentials(creds).build())
        {
            Ok(transport) => Self {
                transport: Some(transport),
                from_address: Some(cfg.from_address),
                frontend_url: cfg.frontend_url,
            },
            Err(e) => {
                tracing::warn!("Failed to build SMTP transport: {e}");
                Self {
                    frontend_url: cfg.frontend_url,
                    ..Self::disabled()
                }
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    pub fn verification_link(&self, token: &str) -> String {
        format!("{}/auth/verify-email?token={}", self.frontend_url, token)
    }

    pub async fn send_verification_email(&self, to: &str, token: &str) -> Result<()> {
        let body = format!(
            "Welcome to Lekhok! Please verify your email by opening the link below:\n\n{}\n\nThis link expires in 24 hours.",
            self.verification_link(token)
        );

        self.send_email(to, "Verify your email", &body).await
    }

    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let (Some(transport), Some(from_address)) = (&self.transport, &self.from_address) else {
            tracing::debug!("SMTP not configured, skipping email to {to}");
            return Ok(());
        };

        let from_mailbox: Mailbox =
            from_address
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    anyhow::anyhow!("Invalid from address '{}': {}", from_address, e)
                })?;
        let to_mailbox: Mailbox = to.parse().map_err(|e: lettre::address::AddressError| {
            anyhow::anyhow!("Invalid to address '{}': {}", to, e)
        })?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        transport.send(email).await?;
        tracing::info!("Email sent to {to}: {subject}");
        Ok(())
    }
}
