use std::{sync::Arc, time::Duration};

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::MailConfig;

#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()>;
}

/// Delivers mail through an HTTP relay that accepts `{from, to, subject, html}`.
#[derive(Clone)]
pub struct HttpMailer {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    /// Every request, connect included, is abandoned after `timeout`.
    pub fn new(
        endpoint: &str,
        api_key: Option<String>,
        from: &str,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("build mail relay client")?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            api_key,
            from: from.to_string(),
        })
    }
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        let mut req = self.client.post(&self.endpoint).json(&RelayPayload {
            from: &self.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
        });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        req.send()
            .await
            .context("mail relay request")?
            .error_for_status()
            .context("mail relay rejected message")?;

        debug!(to = %message.to, subject = %message.subject, "mail sent");
        Ok(())
    }
}

/// Writes outgoing mail to the log instead of delivering it.
#[derive(Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        info!(to = %message.to, subject = %message.subject, "mail relay not configured; message logged only");
        debug!(html = %message.html, "mail body");
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> anyhow::Result<Arc<dyn Mailer>> {
    match &cfg.api_url {
        Some(url) => Ok(Arc::new(HttpMailer::new(
            url,
            cfg.api_key.clone(),
            &cfg.from,
            Duration::from_secs(cfg.timeout_secs),
        )?)),
        None => {
            tracing::warn!("MAIL_API_URL not set; activation mails will only be logged");
            Ok(Arc::new(LogMailer))
        }
    }
}

pub fn activation_message(to: &str, name: &str, link: &str) -> MailMessage {
    let name = escape_html(name);
    MailMessage {
        to: to.to_string(),
        subject: "Activate your CashIn account".to_string(),
        html: format!(
            "<p>Hi {name},</p>\
             <p>Thanks for signing up to CashIn. Click the link below to activate your account:</p>\
             <p><a href=\"{link}\">{link}</a></p>\
             <p>This link expires in 1 hour.</p>"
        ),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
