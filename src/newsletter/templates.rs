use anyhow::Context;
use reqwest::Url;
use time::{macros::format_description, Date};

use crate::articles::repo_types::Article;

/// Key messages shown per article in the digest.
const DIGEST_KEY_MESSAGES: usize = 2;

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn unsubscribe_url(base_url: &str, email: &str) -> anyhow::Result<String> {
    let url = Url::parse_with_params(
        &format!("{base_url}/api/newsletter/unsubscribe"),
        &[("email", email)],
    )
    .context("build unsubscribe url")?;
    Ok(url.into())
}

pub fn digest_subject(today: Date) -> String {
    format!("MedDigest Daily - {} {}", today.month(), today.day())
}

/// Subject recorded in `newsletter_logs`.
pub fn log_subject(today: Date) -> String {
    let ymd = today
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| today.to_string());
    format!("Daily - {ymd}")
}

fn article_card(base_url: &str, a: &Article) -> String {
    let messages: String = a
        .key_messages
        .iter()
        .take(DIGEST_KEY_MESSAGES)
        .enumerate()
        .map(|(i, m)| {
            format!(
                r#"<div style="margin-bottom:8px;"><strong>{}.</strong> <span style="color:#4a5c4b;font-size:14px;">{}</span></div>"#,
                i + 1,
                escape_html(m)
            )
        })
        .collect();

    format!(
        r#"<div style="background:#ffffff;border-radius:12px;padding:24px;margin-bottom:16px;border:1px solid #e8d5c8;">
  <div style="margin-bottom:12px;"><span style="font-size:12px;font-weight:600;">{topic}</span> <span style="color:#9a9a9a;font-size:12px;">{date}</span></div>
  <p style="color:#7d5236;font-size:12px;margin:0 0 8px 0;">{journal}</p>
  <h3 style="color:#2c3e50;font-size:18px;margin:0 0 16px 0;">{title}</h3>
  {messages}
  <a href="{base}/article/{slug}" style="color:#7d5236;font-size:14px;">Read more &rarr;</a>
</div>"#,
        topic = escape_html(&a.topic),
        date = a.published_at,
        journal = escape_html(&a.journal),
        title = escape_html(&a.title),
        base = base_url,
        slug = escape_html(&a.slug),
    )
}

/// Digest body for one subscriber.
pub fn digest_html(base_url: &str, articles: &[Article], unsubscribe_url: &str, today: Date) -> String {
    let cards: String = articles.iter().map(|a| article_card(base_url, a)).collect();
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><meta name="viewport" content="width=device-width, initial-scale=1.0"><title>MedDigest Daily</title></head>
<body style="margin:0;padding:0;background-color:#fcf9f4;font-family:-apple-system,BlinkMacSystemFont,sans-serif;">
<div style="max-width:600px;margin:0 auto;padding:40px 20px;">
  <div style="text-align:center;margin-bottom:32px;">
    <h1 style="color:#2c3e50;font-size:24px;margin:0;">MedDigest</h1>
    <p style="color:#5f7360;font-size:14px;margin:8px 0 0 0;">Daily Med-Bio Insight</p>
  </div>
  <div style="border-radius:16px;padding:32px;text-align:center;margin-bottom:24px;background:#5f7360;">
    <h2 style="color:white;font-size:20px;margin:0 0 8px 0;">Today's paper insights</h2>
    <p style="color:rgba(255,255,255,0.8);font-size:14px;margin:0;">{weekday}, {month} {day}, {year}</p>
  </div>
  {cards}
  <div style="text-align:center;margin:32px 0;">
    <a href="{base}" style="display:inline-block;background:#7d5236;color:white;padding:14px 32px;border-radius:12px;text-decoration:none;">See more papers</a>
  </div>
  <div style="text-align:center;padding-top:24px;border-top:1px solid #e8d5c8;">
    <p style="color:#9a9a9a;font-size:12px;margin:0 0 8px 0;">&copy; {year} MedDigest. Free paper insights for medical professionals.</p>
    <a href="{unsubscribe}" style="color:#9a9a9a;font-size:12px;">Unsubscribe</a>
  </div>
</div>
</body>
</html>"#,
        weekday = today.weekday(),
        month = today.month(),
        day = today.day(),
        year = today.year(),
        cards = cards,
        base = base_url,
        unsubscribe = escape_html(unsubscribe_url),
    )
}

pub const WELCOME_SUBJECT: &str = "Welcome to the MedDigest newsletter!";

pub fn welcome_html(base_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="margin:0;padding:40px 20px;background-color:#fcf9f4;font-family:-apple-system,BlinkMacSystemFont,sans-serif;">
<div style="max-width:500px;margin:0 auto;text-align:center;">
  <h1 style="color:#2c3e50;font-size:24px;margin:0 0 16px;">Welcome!</h1>
  <p style="color:#5f7360;font-size:16px;line-height:1.6;margin:0 0 24px;">
    Your MedDigest subscription is confirmed.<br>
    Every morning you will get hand-picked Med-Bio paper insights.
  </p>
  <a href="{base_url}" style="display:inline-block;background:#7d5236;color:white;padding:14px 32px;border-radius:12px;text-decoration:none;">Read today's papers</a>
</div>
</body>
</html>"#
    )
}

/// Same page whether or not the email was subscribed.
pub fn unsubscribed_page(base_url: &str) -> String {
    format!(
        r#"<html><body style="font-family:sans-serif;text-align:center;padding:50px;background:#fcf9f4;">
<div style="max-width:400px;margin:0 auto;">
  <h2 style="color:#2c3e50;">You have been unsubscribed</h2>
  <p style="color:#5f7360;">Your MedDigest newsletter subscription has been cancelled.<br>You can subscribe again at any time.</p>
  <a href="{base_url}" style="color:#7d5236;">Back to home</a>
</div>
</body></html>"#
    )
}

pub fn error_page(message: &str) -> String {
    format!(
        r#"<html><body style="font-family:sans-serif;text-align:center;padding:50px;">
<h2>{}</h2>
</body></html>"#,
        escape_html(message)
    )
}
