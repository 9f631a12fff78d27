//! Price drop notifications over SMTP

use crate::config::EmailConfig;
use crate::error::Result;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// A product whose price reached its target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceAlert {
    pub product_name: String,
    pub url: String,
    pub current_price: f64,
    pub target_price: f64,
}

impl PriceAlert {
    pub fn savings(&self) -> f64 {
        self.target_price - self.current_price
    }
}

/// Sends alerts to the configured recipient
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    email: Option<EmailConfig>,
}

impl Notifier {
    pub fn new(email: Option<EmailConfig>) -> Self {
        Self { email }
    }

    pub fn is_enabled(&self) -> bool {
        self.email.is_some()
    }

    /// Send an alert. Returns whether a message was delivered.
    ///
    /// Missing configuration and delivery failures are logged, never returned.
    pub async fn notify(&self, alert: &PriceAlert) -> bool {
        let Some(email) = &self.email else {
            warn!("Email configuration not available. Skipping notification.");
            return false;
        };

        match deliver(email, alert).await {
            Ok(()) => {
                info!("NOTIFICATION: Email sent to {}", email.to_email);
                true
            }
            Err(e) => {
                warn!(product = %alert.product_name, "Failed to send email notification: {}", e);
                false
            }
        }
    }
}

async fn deliver(email: &EmailConfig, alert: &PriceAlert) -> Result<()> {
    let message = compose_message(email, alert)?;

    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&email.smtp_server)?
        .port(email.smtp_port)
        .credentials(Credentials::new(
            email.from_email.clone(),
            email.password.clone(),
        ))
        .build();

    transport.send(message).await?;
    Ok(())
}

/// Build the alert email
pub fn compose_message(email: &EmailConfig, alert: &PriceAlert) -> Result<Message> {
    let message = Message::builder()
        .from(email.from_email.parse::<Mailbox>()?)
        .to(email.to_email.parse::<Mailbox>()?)
        .subject(format!("Price Drop Alert: {}", alert.product_name))
        .header(ContentType::TEXT_HTML)
        .body(render_body(alert))?;
    Ok(message)
}

fn render_body(alert: &PriceAlert) -> String {
    format!(
        r#"<html>
<body>
    <h2>Price Drop Alert!</h2>
    <p>Good news! A product on your tracking list has dropped below your target price.</p>

    <h3>{name}</h3>
    <p>Current Price: <strong>${current:.2}</strong></p>
    <p>Your Target Price: ${target:.2}</p>
    <p>Savings: ${savings:.2}</p>

    <p><a href="{url}">View product</a></p>

    <p>This is an automated message from pricewatch.</p>
</body>
</html>
"#,
        name = escape_html(&alert.product_name),
        current = alert.current_price,
        target = alert.target_price,
        savings = alert.savings(),
        url = escape_html(&alert.url),
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn email() -> EmailConfig {
        EmailConfig {
            from_email: "tracker@example.com".to_string(),
            to_email: "me@example.com".to_string(),
            smtp_server: "127.0.0.1".to_string(),
            smtp_port: 9,
            password: "secret".to_string(),
        }
    }

    fn alert() -> PriceAlert {
        PriceAlert {
            product_name: "Desk Lamp".to_string(),
            url: "https://www.amazon.com/dp/B0LAMP".to_string(),
            current_price: 15.0,
            target_price: 20.0,
        }
    }

    #[test]
    fn test_savings() {
        assert_eq!(alert().savings(), 5.0);
    }

    #[test]
    fn test_compose_message_headers() {
        let message = compose_message(&email(), &alert()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Price Drop Alert: Desk Lamp"));
        assert!(raw.contains("To: me@example.com"));
        assert!(raw.contains("From: tracker@example.com"));
        assert!(raw.contains("text/html"));
    }

    #[test]
    fn test_body_mentions_prices_and_link() {
        let body = render_body(&alert());
        assert!(body.contains("Current Price: <strong>$15.00</strong>"));
        assert!(body.contains("Your Target Price: $20.00"));
        assert!(body.contains("Savings: $5.00"));
        assert!(body.contains(r#"href="https://www.amazon.com/dp/B0LAMP""#));
    }

    #[test]
    fn test_body_escapes_name() {
        let mut alert = alert();
        alert.product_name = "Cable <3m> & adapter".to_string();
        let body = render_body(&alert);
        assert!(body.contains("Cable &lt;3m&gt; &amp; adapter"));
    }

    #[test]
    fn test_invalid_address_is_error() {
        let mut email = email();
        email.to_email = "not an address".to_string();
        assert!(compose_message(&email, &alert()).is_err());
    }

    #[tokio::test]
    async fn test_disabled_notifier_skips() {
        let notifier = Notifier::default();
        assert!(!notifier.is_enabled());
        assert!(!notifier.notify(&alert()).await);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let notifier = Notifier::new(Some(email()));
        assert!(!notifier.notify(&alert()).await);
    }
}
