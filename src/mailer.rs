//! Mail sender - one plain-text email over SMTP with implicit TLS
//!
//! Every failure is reported as a [`SendOutcome`] value. Nothing in here
//! returns `Err` to the caller, so the agent can relay what went wrong.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{SmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::Message;
use serde_json::json;
use std::time::Duration;

/// Account identity used as the SMTP login and the From header
pub const MAIL_USER_ENV: &str = "GMAIL_USER";
/// Provider-issued app password
pub const MAIL_PASSWORD_ENV: &str = "GMAIL_APP_PASSWORD";

pub const SMTP_HOST: &str = "smtp.gmail.com";
pub const SMTP_PORT: u16 = 465;

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Marker the provider puts in a credential rejection
const REJECTED_CREDENTIALS_MARKER: &str = "Username and Password not accepted";

const MISSING_CREDENTIALS_MESSAGE: &str =
    "Gmail credentials not found in environment variables. Set GMAIL_USER and GMAIL_APP_PASSWORD.";

const AUTH_TROUBLESHOOTING_MESSAGE: &str = "Authentication failed. Please check that:
1. Your Gmail account has 2-Step Verification enabled
2. You're using an App Password (not your regular password)
3. The App Password is correct and has no extra spaces
4. If you can't access App Passwords, you may need to use a regular password with 'Less secure app access' enabled";

/// Result of a single send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent { recipient: String, subject: String },
    /// `GMAIL_USER` or `GMAIL_APP_PASSWORD` unset or empty
    MissingCredentials,
    /// The provider rejected the username/password pair
    AuthenticationRejected,
    /// Any other SMTP error while authenticating
    AuthenticationFailed(String),
    /// Message build, connection or delivery failure
    Failed(String),
}

impl SendOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }

    /// Text reported to the agent for the error variants
    pub fn error_message(&self) -> Option<String> {
        match self {
            SendOutcome::Sent { .. } => None,
            SendOutcome::MissingCredentials => Some(MISSING_CREDENTIALS_MESSAGE.to_string()),
            SendOutcome::AuthenticationRejected => Some(AUTH_TROUBLESHOOTING_MESSAGE.to_string()),
            SendOutcome::AuthenticationFailed(msg) => {
                Some(format!("SMTP Authentication Error: {}", msg))
            }
            SendOutcome::Failed(msg) => Some(format!("Failed to send email: {}", msg)),
        }
    }

    /// JSON payload handed back through the send tool
    pub fn to_payload(&self) -> serde_json::Value {
        match self {
            SendOutcome::Sent { recipient, subject } => json!({
                "status": "success",
                "message": format!("Email sent to {}", recipient),
                "details": {
                    "recipient": recipient,
                    "subject": subject
                }
            }),
            _ => json!({ "error": self.error_message().unwrap_or_default() }),
        }
    }
}

/// Login for the mail provider
#[derive(Clone)]
pub struct MailCredentials {
    pub user: String,
    pub app_password: String,
}

impl std::fmt::Debug for MailCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailCredentials")
            .field("user", &self.user)
            .field("app_password", &"<redacted>")
            .finish()
    }
}

impl MailCredentials {
    /// Read both values from the process environment
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Both values must be present and non-empty
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let user = lookup(MAIL_USER_ENV).filter(|v| !v.is_empty())?;
        let app_password = lookup(MAIL_PASSWORD_ENV).filter(|v| !v.is_empty())?;
        Some(Self { user, app_password })
    }
}

/// Failures at the SMTP boundary, split by phase
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{0}")]
    Connect(String),
    #[error("{0}")]
    Auth(String),
    #[error("{0}")]
    Send(String),
}

/// Opens authenticated sessions with the provider
pub trait MailTransport: Send + Sync {
    /// Connect and authenticate
    fn open(&self, credentials: &MailCredentials) -> Result<Box<dyn MailSession>, TransportError>;
}

/// An authenticated SMTP session
pub trait MailSession {
    fn send(&mut self, email: &Message) -> Result<(), TransportError>;

    /// Best-effort goodbye
    fn quit(&mut self);
}

/// Implicit-TLS SMTP transport backed by lettre
#[derive(Debug, Clone)]
pub struct SmtpTlsTransport {
    host: String,
    port: u16,
}

impl SmtpTlsTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for SmtpTlsTransport {
    fn default() -> Self {
        Self::new(SMTP_HOST, SMTP_PORT)
    }
}

impl MailTransport for SmtpTlsTransport {
    fn open(&self, credentials: &MailCredentials) -> Result<Box<dyn MailSession>, TransportError> {
        let tls = TlsParameters::new(self.host.clone())
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let mut conn = SmtpConnection::connect(
            (self.host.as_str(), self.port),
            Some(SMTP_TIMEOUT),
            &ClientId::default(),
            Some(&tls),
            None,
        )
        .map_err(|e| TransportError::Connect(e.to_string()))?;

        let creds = Credentials::new(credentials.user.clone(), credentials.app_password.clone());
        if let Err(e) = conn.auth(&[Mechanism::Plain, Mechanism::Login], &creds) {
            let _ = conn.quit();
            // Only server replies count as authentication errors
            return Err(if e.is_permanent() || e.is_transient() {
                TransportError::Auth(e.to_string())
            } else {
                TransportError::Connect(e.to_string())
            });
        }

        Ok(Box::new(SmtpTlsSession { conn }))
    }
}

struct SmtpTlsSession {
    conn: SmtpConnection,
}

impl MailSession for SmtpTlsSession {
    fn send(&mut self, email: &Message) -> Result<(), TransportError> {
        self.conn
            .send(email.envelope(), &email.formatted())
            .map(|_| ())
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    fn quit(&mut self) {
        let _ = self.conn.quit();
    }
}

/// Builds and sends messages through a [`MailTransport`]
pub struct Mailer {
    transport: Box<dyn MailTransport>,
}

impl Default for Mailer {
    fn default() -> Self {
        Self::new(SmtpTlsTransport::default())
    }
}

impl Mailer {
    pub fn new<T: MailTransport + 'static>(transport: T) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    /// Send with credentials from the environment, read at call time
    pub fn send(&self, recipient: &str, subject: &str, body: &str) -> SendOutcome {
        self.send_with(MailCredentials::from_env(), recipient, subject, body)
    }

    pub fn send_with(
        &self,
        credentials: Option<MailCredentials>,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> SendOutcome {
        let Some(credentials) = credentials else {
            tracing::warn!("Mail credentials missing, not sending");
            return SendOutcome::MissingCredentials;
        };

        let mut session = match self.transport.open(&credentials) {
            Ok(session) => session,
            Err(TransportError::Auth(msg)) => {
                tracing::warn!(error = %msg, "SMTP authentication failed");
                return if msg.contains(REJECTED_CREDENTIALS_MARKER) {
                    SendOutcome::AuthenticationRejected
                } else {
                    SendOutcome::AuthenticationFailed(msg)
                };
            }
            Err(e) => {
                tracing::warn!(error = %e, "SMTP connection failed");
                return SendOutcome::Failed(e.to_string());
            }
        };

        // Addresses are only validated once login has succeeded
        let result = match build_message(&credentials.user, recipient, subject, body) {
            Ok(email) => session.send(&email).map_err(|e| e.to_string()),
            Err(e) => Err(e),
        };
        session.quit();

        match result {
            Ok(()) => {
                tracing::info!(recipient = recipient, "Email sent");
                SendOutcome::Sent {
                    recipient: recipient.to_string(),
                    subject: subject.to_string(),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SMTP delivery failed");
                SendOutcome::Failed(e)
            }
        }
    }
}

fn build_message(from: &str, to: &str, subject: &str, body: &str) -> Result<Message, String> {
    let from: Mailbox = from
        .parse()
        .map_err(|e| format!("Invalid sender address '{}': {}", from, e))?;
    let to: Mailbox = to
        .parse()
        .map_err(|e| format!("Invalid recipient address '{}': {}", to, e))?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| e.to_string())
}
