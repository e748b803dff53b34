use once_cell::sync::Lazy;
use regex::Regex;

use super::{email_footer, normalize_date, EmailContext, Extractor, NotificationEmail, Observation};

// "IDUs registrados al ... <span>dd/mm/yyyy</span>", possibly across lines
static REGISTERED_DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)IDUs?\s+registrados\s+al.*?<span[^>]*>\s*([0-9]{2}[/-][0-9]{2}[/-][0-9]{4})\s*</span>",
    )
    .expect("Failed to compile registered date regex")
});

// Looser search for a date close to the headline, never past a line break
static HEADLINE_DATE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)se\s+han\s+habilitado\s+los\s+IDUs?[^\r\n\x{2028}\x{2029}]{0,300}?([0-9]{2}[/-][0-9]{2}[/-][0-9]{4})",
    )
    .expect("Failed to compile headline date regex")
});

/// Publication date of the last registered IDUs, always `dd/mm/yyyy`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct IduDate(String);

impl AsRef<str> for IduDate {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DateExtractor;

impl Extractor for DateExtractor {
    type Output = IduDate;

    fn extract(&self, html: &str) -> Option<IduDate> {
        REGISTERED_DATE_PATTERN
            .captures(html)
            .or_else(|| HEADLINE_DATE_PATTERN.captures(html))
            .and_then(|captures| captures.get(1))
            .map(|date| IduDate(normalize_date(date.as_str())))
    }
}

impl Observation for IduDate {
    fn marker(&self) -> String {
        self.0.clone()
    }

    fn compose_email(&self, context: &EmailContext<'_>) -> NotificationEmail {
        let previous = context.previous.unwrap_or("N/A");

        if context.changed {
            NotificationEmail {
                subject: format!("LMD IDU date CHANGED: {} → {}", previous, self.0),
                html: format!(
                    r#"
    <p><strong>Hubo una actualización en la fecha de IDUs!!!</strong></p>
    <p><strong>Fecha publicada:</strong> {}<br/><strong>Actual:</strong> {}</p>{}"#,
                    previous,
                    self.0,
                    email_footer(context)
                ),
            }
        } else {
            NotificationEmail {
                subject: format!("LMD IDU date (no change): {}", self.0),
                html: format!(
                    r#"
    <p><strong>No hubo actualización en la fecha de IDUs.</strong></p>
    <p><strong>Fecha publicada:</strong> {}</p>{}"#,
                    self.0,
                    email_footer(context)
                ),
            }
        }
    }
}
