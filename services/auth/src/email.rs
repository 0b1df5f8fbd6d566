//! OTP email delivery

use async_trait::async_trait;
use common::settings::SmtpConfig;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{error, info, warn};

use crate::models::OtpPurpose;

pub const OTP_SUBJECT: &str = "TubeMind AI - OTP Verification Code";

/// Sends OTP codes to users
///
/// Delivery is best effort: implementations log failures and report them as
/// `false` instead of erroring.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_otp(&self, to: &str, code: &str, purpose: OtpPurpose) -> bool;
}

/// HTML body of an OTP email
pub fn otp_email_body(code: &str, purpose: OtpPurpose) -> String {
    let (heading, intro, ignore) = match purpose {
        OtpPurpose::Signup => (
            "Welcome to TubeMind AI!",
            "Thank you for registering. Please use the following OTP code to verify your email:",
            "If you didn't request this code, please ignore this email.",
        ),
        OtpPurpose::ForgotPassword => (
            "Password Reset Request",
            "You requested to reset your password. Please use the following OTP code:",
            "If you didn't request a password reset, please ignore this email.",
        ),
    };

    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; padding: 20px;">
    <h2 style="color: #00D4FF;">{heading}</h2>
    <p>{intro}</p>
    <div style="background-color: #1A1A1A; color: #00D4FF; padding: 20px; text-align: center; font-size: 32px; font-weight: bold; border-radius: 8px; margin: 20px 0;">
        {code}
    </div>
    <p>This code will expire in 1 hour.</p>
    <p>{ignore}</p>
    <hr>
    <p style="color: #808080; font-size: 12px;">TubeMind AI Team</p>
</body>
</html>"#
    )
}

/// SMTP sender using STARTTLS
#[derive(Clone)]
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpEmailSender {
    pub fn new(config: &SmtpConfig) -> anyhow::Result<Self> {
        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        let from = config
            .from
            .clone()
            .unwrap_or_else(|| config.username.clone());

        info!("SMTP sender configured for {}:{}", config.host, config.port);
        Ok(Self { transport, from })
    }

    async fn deliver(&self, to: &str, code: &str, purpose: OtpPurpose) -> anyhow::Result<()> {
        let message = Message::builder()
            .from(self.from.parse()?)
            .to(to.parse()?)
            .subject(OTP_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(otp_email_body(code, purpose))?;

        self.transport.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send_otp(&self, to: &str, code: &str, purpose: OtpPurpose) -> bool {
        match self.deliver(to, code, purpose).await {
            Ok(()) => {
                info!("Sent {} OTP email to {}", purpose, to);
                true
            }
            Err(e) => {
                error!("Error sending email to {}: {}", to, e);
                false
            }
        }
    }
}

/// Sender used when SMTP is not configured. Codes only reach the log.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send_otp(&self, to: &str, code: &str, purpose: OtpPurpose) -> bool {
        warn!(
            "SMTP not configured; {} OTP for {} is {}",
            purpose, to, code
        );
        true
    }
}
