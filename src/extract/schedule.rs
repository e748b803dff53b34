use once_cell::sync::Lazy;
use regex::Regex;

use super::{email_footer, normalize_date, EmailContext, Extractor, NotificationEmail, Observation};

/// How far past the last month heading the range and cutoff are looked for.
const LAST_BLOCK_MAX_CHARS: usize = 1500;
const MISSING_CUTOFF: &str = "registrados hasta N/D";
const FIELD_SEPARATOR: &str = "|";
const ENTRY_SEPARATOR: &str = "||";

static WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"));

static MONTH_HEADING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:enero|febrero|marzo|abril|mayo|junio|julio|agosto|septiembre|setiembre|octubre|noviembre|diciembre)\s+(?:de\s+)?[0-9]{4}\b",
    )
    .expect("Failed to compile month heading regex")
});

// "desde el código 12345 hasta el código 12999", markup allowed around the codes
static CODE_RANGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:desde|del)\s+(?:el\s+)?c[óo]digo\s*(?:<[^>]*>\s*)*([A-Z0-9-]+)\s*(?:<[^>]*>\s*)*(?:hasta|al)\s+(?:el\s+)?c[óo]digo\s*(?:<[^>]*>\s*)*([A-Z0-9-]+)",
    )
    .expect("Failed to compile code range regex")
});

static REGISTERED_UNTIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)registrados\s+hasta\s+(?:el\s+)?(?:<[^>]*>\s*)*([0-9]{2}[/-][0-9]{2}[/-][0-9]{4})")
        .expect("Failed to compile cutoff regex")
});

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScheduleEntry {
    pub month: String,
    pub range: String,
    pub cutoff: String,
}

/// Monthly IDU enablement schedule, in page order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Schedule(Vec<ScheduleEntry>);

impl Schedule {
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.0
    }

    /// Order-sensitive flattening of every field of every entry.
    pub fn signature(&self) -> String {
        self.0
            .iter()
            .map(|entry| {
                [
                    entry.month.as_str(),
                    entry.range.as_str(),
                    entry.cutoff.as_str(),
                ]
                .join(FIELD_SEPARATOR)
            })
            .collect::<Vec<_>>()
            .join(ENTRY_SEPARATOR)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ScheduleExtractor;

impl ScheduleExtractor {
    pub fn extract_entries(&self, html: &str) -> Vec<ScheduleEntry> {
        let text = WHITESPACE.replace_all(html, " ");
        let headings: Vec<_> = MONTH_HEADING.find_iter(&text).collect();

        headings
            .iter()
            .enumerate()
            .filter_map(|(index, heading)| {
                let end = match headings.get(index + 1) {
                    Some(next) => next.start(),
                    None => char_limit(&text, heading.start(), LAST_BLOCK_MAX_CHARS),
                };
                let block = &text[heading.start()..end];

                let range = CODE_RANGE.captures(block)?;
                let cutoff = REGISTERED_UNTIL
                    .captures(block)
                    .map(|captures| format!("registrados hasta {}", normalize_date(&captures[1])))
                    .unwrap_or_else(|| MISSING_CUTOFF.to_string());

                Some(ScheduleEntry {
                    month: heading.as_str().to_string(),
                    range: format!("del código {} al código {}", &range[1], &range[2]),
                    cutoff,
                })
            })
            .collect()
    }
}

impl Extractor for ScheduleExtractor {
    type Output = Schedule;

    fn extract(&self, html: &str) -> Option<Schedule> {
        let entries = self.extract_entries(html);

        if entries.is_empty() {
            return None;
        }

        Some(Schedule(entries))
    }
}

/// Byte offset `max_chars` characters after `start`, clamped to the end of `text`.
fn char_limit(text: &str, start: usize, max_chars: usize) -> usize {
    text[start..]
        .char_indices()
        .nth(max_chars)
        .map(|(offset, _)| start + offset)
        .unwrap_or(text.len())
}

impl Observation for Schedule {
    fn marker(&self) -> String {
        self.signature()
    }

    fn compose_email(&self, context: &EmailContext<'_>) -> NotificationEmail {
        let rows: String = self
            .0
            .iter()
            .map(|entry| {
                format!(
                    "\n      <tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    entry.month, entry.range, entry.cutoff
                )
            })
            .collect();
        let table = format!(
            r#"
    <table cellpadding="4" border="1" style="border-collapse: collapse;">
      <tr><th>Mes</th><th>Códigos</th><th>Registrados</th></tr>{}
    </table>"#,
            rows
        );

        let (subject, headline) = if context.changed {
            (
                "Calendario de IDUs: ¡hay novedades!",
                "Hubo una actualización en el calendario de IDUs!!!",
            )
        } else {
            (
                "Calendario de IDUs (sin cambios)",
                "No hubo actualización en el calendario de IDUs.",
            )
        };

        NotificationEmail {
            subject: subject.to_string(),
            html: format!(
                "\n    <p><strong>{}</strong></p>{}{}",
                headline,
                table,
                email_footer(context)
            ),
        }
    }
}
