//! Email dispatch for contact submissions using lettre

use crate::config::{ContactConfig, SmtpConfig};
use anyhow::{Context, Result};
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::sync::{Arc, Mutex};
use tracing::info;

/// A validated contact submission, carried only as an email payload
#[derive(Debug, Clone)]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Captured message when the service runs in mock mode
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
}

pub type Outbox = Arc<Mutex<Vec<OutboundEmail>>>;

/// Email service for the owner notification and the submitter auto-reply
#[derive(Clone)]
pub struct EmailService {
    mailer: SmtpTransport,
    from_address: String,
    from_name: String,
    owner_email: String,
    owner_name: String,
    outbox: Option<Outbox>,
}

impl EmailService {
    /// Create a new email service from configuration
    pub fn new(smtp: &SmtpConfig, contact: &ContactConfig) -> Result<Self> {
        let mailer = if smtp.username.is_empty() || smtp.password.is_empty() {
            info!(
                smtp_host = %smtp.host,
                smtp_port = smtp.port,
                "SMTP credentials not configured, using unauthenticated connection (e.g., MailDev)"
            );
            SmtpTransport::builder_dangerous(&smtp.host)
                .port(smtp.port)
                .build()
        } else {
            // relay() uses STARTTLS by default, appropriate for port 587
            let creds = Credentials::new(smtp.username.clone(), smtp.password.clone());
            SmtpTransport::relay(&smtp.host)
                .context("Failed to create SMTP transport")?
                .port(smtp.port)
                .credentials(creds)
                .build()
        };

        let from_address = if smtp.username.is_empty() {
            "noreply@portfolio.local".to_string()
        } else {
            smtp.username.clone()
        };

        Ok(Self {
            mailer,
            from_address,
            from_name: smtp.from_name.clone(),
            owner_email: contact.owner_email.clone(),
            owner_name: contact.owner_name.clone(),
            outbox: None,
        })
    }

    /// Create a mock email service for testing (skips actual SMTP)
    ///
    /// Returns the service together with a shared outbox that records every
    /// message the service would have sent.
    pub fn new_mock(contact: &ContactConfig) -> (Self, Outbox) {
        let outbox: Outbox = Arc::new(Mutex::new(Vec::new()));
        let service = Self {
            mailer: SmtpTransport::builder_dangerous("localhost")
                .port(1025)
                .build(),
            from_address: "noreply@portfolio.local".to_string(),
            from_name: "Portfolio Contact".to_string(),
            owner_email: contact.owner_email.clone(),
            owner_name: contact.owner_name.clone(),
            outbox: Some(outbox.clone()),
        };
        (service, outbox)
    }

    /// Send the notification email to the fixed owner address
    pub fn send_owner_notification(&self, submission: &Submission) -> Result<()> {
        let text_body = format!(
            "Name: {}\nEmail: {}\nSubject: {}\nMessage: {}",
            submission.name, submission.email, submission.subject, submission.message
        );
        let html_body = format!(
            "<b>Name:</b> {}<br/><b>Email:</b> {}<br/><b>Subject:</b> {}<br/><b>Message:</b><br/>{}",
            submission.name, submission.email, submission.subject, submission.message
        );

        let from: Mailbox = format!("{} <{}>", self.from_name, self.from_address)
            .parse()
            .context("Failed to parse from address")?;

        self.dispatch(
            from,
            &self.owner_email,
            "New Inquiry from your Portfolio",
            text_body,
            html_body,
        )?;

        info!(
            name = %submission.name,
            email = %submission.email,
            "Owner notification sent"
        );
        Ok(())
    }

    /// Send the acknowledgment auto-reply to the submitter
    pub fn send_auto_reply(&self, submission: &Submission) -> Result<()> {
        let text_body = format!(
            "Dear {},\n\nThank you for your email. Your message has been received and I \
             will get back to you as soon as possible.\n\nIf you need to reach me \
             directly, contact {}.\n\nBest regards,\n{}",
            submission.name, self.owner_email, self.owner_name
        );
        let html_body = format!(
            "<p>Dear {},</p><p>Thank you for your email. Your message has been received \
             and I will get back to you as soon as possible.</p><p>If you need to reach \
             me directly, contact <a href=\"mailto:{}\">{}</a>.</p>\
             <p>Best regards,<br/>{}</p>",
            submission.name, self.owner_email, self.owner_email, self.owner_name
        );

        let from: Mailbox = format!("{} <{}>", self.owner_name, self.from_address)
            .parse()
            .context("Failed to parse from address")?;

        let subject = format!("Thank you for contacting {}", self.owner_name);
        self.dispatch(from, &submission.email, &subject, text_body, html_body)?;

        info!(to = %submission.email, "Auto-reply sent");
        Ok(())
    }

    fn dispatch(
        &self,
        from: Mailbox,
        to: &str,
        subject: &str,
        text_body: String,
        html_body: String,
    ) -> Result<()> {
        if let Some(outbox) = &self.outbox {
            let mut outbox = outbox
                .lock()
                .map_err(|_| anyhow::anyhow!("outbox mutex poisoned"))?;
            outbox.push(OutboundEmail {
                to: to.to_string(),
                subject: subject.to_string(),
                text_body,
            });
            return Ok(());
        }

        let to_mailbox: Mailbox = to.parse().context("Failed to parse to address")?;

        let email = Message::builder()
            .from(from)
            .to(to_mailbox)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )
            .context("Failed to build email message")?;

        self.mailer.send(&email).context("SMTP send failed")?;
        Ok(())
    }
}
