use anyhow::Result;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
    message::{Mailbox, Message, MultiPart},
    transport::smtp::authentication::Credentials,
};
use uuid::Uuid;

use crate::config::SmtpConfig;

/// Car data captured at checkout time for the confirmation mail.
#[derive(Debug, Clone)]
pub struct CarSummary {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
}

/// Outbound mail handle. Without `SMTP_HOST` the transport is absent and
/// every send becomes a logged no-op, which keeps local runs and tests
/// independent of a mail server.
#[derive(Clone)]
pub struct Mailer {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: Mailbox,
}

impl Mailer {
    pub fn from_config(config: &SmtpConfig) -> Result<Self> {
        let from: Mailbox = config.from.parse()?;

        let transport = match config.host.as_deref() {
            Some(host) => {
                let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?;
                if let (Some(user), Some(pass)) = (&config.username, &config.password) {
                    builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
                }
                Some(builder.build())
            }
            None => None,
        };

        Ok(Self { transport, from })
    }

    /// A mailer that never sends anything.
    pub fn disabled() -> Self {
        Self {
            transport: None,
            from: "CarShop <no-reply@carshop.example>"
                .parse()
                .unwrap_or_else(|_| unreachable!("static mailbox literal")),
        }
    }

    pub async fn send_order_confirmation(
        &self,
        to: &str,
        username: &str,
        order_id: Uuid,
        cars: &[CarSummary],
    ) -> Result<()> {
        let Some(transport) = &self.transport else {
            tracing::debug!(%order_id, "mailer disabled, skipping confirmation email");
            return Ok(());
        };

        let total: i64 = cars.iter().map(|c| c.price).sum();
        let subject = format!("Order confirmation #{order_id} - CarShop");

        let mut plain = format!(
            "Hello, {username}!\n\nThank you for your order at CarShop.\n\nOrder details:\n"
        );
        for car in cars {
            plain.push_str(&format!(
                "- {} {} ({}) - {}\n",
                car.brand,
                car.model,
                car.year,
                format_price(car.price)
            ));
        }
        plain.push_str(&format!(
            "\nTotal: {}\n\nBest regards,\nThe CarShop team\n",
            format_price(total)
        ));

        let mut rows = String::new();
        for car in cars {
            rows.push_str(&format!(
                "<tr><td>{} {} ({})</td><td>{}</td></tr>",
                car.brand,
                car.model,
                car.year,
                format_price(car.price)
            ));
        }
        let html = format!(
            "<html><body><h2>Thank you for your order, {username}!</h2>\
             <table>{rows}</table>\
             <p><strong>Total: {}</strong></p>\
             <p>Best regards,<br>The CarShop team</p></body></html>",
            format_price(total)
        );

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.parse()?)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(plain, html))?;

        transport.send(message).await?;
        Ok(())
    }
}

/// Render minor currency units with two decimal places.
pub fn format_price(minor: i64) -> String {
    format!("{}.{:02}", minor / 100, (minor % 100).abs())
}
