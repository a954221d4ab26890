use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};

use crate::config::SmtpConfig;
use crate::services::error::ServiceError;

/// Template id for the sponsor one-time login code mail.
pub const SPONSOR_CODE_TEMPLATE: &str = "sponsor_login_code";

/// Outbound mail contract: the rest of the service only ever names a
/// recipient, a template and its substitutions. Rendering and transport
/// stay behind this trait.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(
        &self,
        recipient: &str,
        template_id: &str,
        substitutions: &HashMap<String, String>,
    ) -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub struct SmtpMailer {
    mailer: SmtpTransport,
    from_address: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, ServiceError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| ServiceError::Mail(e.to_string()))?
            .credentials(creds)
            .port(587)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Mail transport initialized");

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    async fn send_rendered(
        &self,
        recipient: &str,
        subject: &str,
        plain_body: String,
        html_body: String,
    ) -> Result<(), ServiceError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e: lettre::address::AddressError| ServiceError::Mail(e.to_string()))?,
            )
            .to(recipient
                .parse()
                .map_err(|e: lettre::address::AddressError| ServiceError::Mail(e.to_string()))?)
            .subject(subject)
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain_body),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .map_err(|e| ServiceError::Mail(e.to_string()))?;

        // SMTP send happens on the blocking pool so it cannot stall the
        // async runtime.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| ServiceError::Mail(e.to_string()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %recipient, subject = %subject, "Email sent successfully");
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e.to_string(), to = %recipient, "Failed to send email");
                Err(ServiceError::Mail(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl MailSender for SmtpMailer {
    async fn send(
        &self,
        recipient: &str,
        template_id: &str,
        substitutions: &HashMap<String, String>,
    ) -> Result<(), ServiceError> {
        match template_id {
            SPONSOR_CODE_TEMPLATE => {
                let plain = render(SPONSOR_CODE_PLAIN, substitutions);
                let html = render(SPONSOR_CODE_HTML, substitutions);
                self.send_rendered(recipient, "Your sponsor login code", plain, html)
                    .await
            }
            other => Err(ServiceError::Mail(format!(
                "unknown mail template '{}'",
                other
            ))),
        }
    }
}

/// Replaces each `{{key}}` marker with its substitution value.
fn render(template: &str, substitutions: &HashMap<String, String>) -> String {
    let mut rendered = template.to_string();
    for (key, value) in substitutions {
        rendered = rendered.replace(&format!("{{{{{}}}}}", key), value);
    }
    rendered
}

const SPONSOR_CODE_PLAIN: &str = "Your sponsor login code\n\n\
    Use the following code to sign in to the sponsor portal:\n\n\
    {{code}}\n\n\
    The code expires in {{ttl_minutes}} minutes. If you didn't request it, you can ignore this email.";

const SPONSOR_CODE_HTML: &str = r###"<html>
    <body style="font-family: Arial, sans-serif;">
        <h2>Your sponsor login code</h2>
        <p>Use the following code to sign in to the sponsor portal:</p>
        <p style="font-size: 28px; letter-spacing: 4px; font-weight: bold;">{{code}}</p>
        <p style="color: #666; font-size: 12px;">
            The code expires in {{ttl_minutes}} minutes. If you didn't request it, you can ignore this email.
        </p>
    </body>
</html>
"###;

/// Records every send instead of talking SMTP; failure can be injected to
/// exercise callers' degraded paths.
#[derive(Default)]
pub struct MockMailer {
    sent: Mutex<Vec<SentMail>>,
    fail: Mutex<bool>,
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub recipient: String,
    pub template_id: String,
    pub substitutions: HashMap<String, String>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl MailSender for MockMailer {
    async fn send(
        &self,
        recipient: &str,
        template_id: &str,
        substitutions: &HashMap<String, String>,
    ) -> Result<(), ServiceError> {
        if *self.fail.lock().unwrap() {
            return Err(ServiceError::Mail("injected mail failure".to_string()));
        }
        self.sent.lock().unwrap().push(SentMail {
            recipient: recipient.to_string(),
            template_id: template_id.to_string(),
            substitutions: substitutions.clone(),
        });
        Ok(())
    }
}
