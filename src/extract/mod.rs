//! Pulls the watched value out of the consulate page.
//!
//! The patterns are tied to the markup of one specific page. They live behind
//! [`Extractor`] so the pipeline never depends on how a value is found, only on
//! what it looks like once found.

pub mod date;
pub mod schedule;

pub use date::{DateExtractor, IduDate};
pub use schedule::{Schedule, ScheduleEntry, ScheduleExtractor};

/// Finds the watched value in raw HTML.
///
/// Returning `None` means the page did not contain anything recognizable,
/// which callers report as a benign "nothing found" rather than an error.
pub trait Extractor: Send + Sync {
    type Output: Observation;

    fn extract(&self, html: &str) -> Option<Self::Output>;
}

/// A freshly extracted value.
pub trait Observation: serde::Serialize + Send + Sync {
    /// String persisted between runs and compared by exact equality.
    fn marker(&self) -> String;

    fn compose_email(&self, context: &EmailContext<'_>) -> NotificationEmail;
}

/// Per-recipient details needed to render a notification.
#[derive(Debug, Clone, Copy)]
pub struct EmailContext<'a> {
    pub previous: Option<&'a str>,
    pub changed: bool,
    pub page_url: &'a str,
    pub unsubscribe_url: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEmail {
    pub subject: String,
    pub html: String,
}

pub(crate) fn normalize_date(date: &str) -> String {
    date.replace('-', "/")
}

pub(crate) fn email_footer(context: &EmailContext<'_>) -> String {
    format!(
        r#"
    <p>Link a la página: <a href="{page_url}">{page_url}</a></p>
    <p style="font-size: 12px; color: #666;">Si no querés recibir más estos correos, podés <a href="{unsubscribe_url}">desuscribirte acá</a>.</p>
"#,
        page_url = context.page_url,
        unsubscribe_url = context.unsubscribe_url
    )
}
