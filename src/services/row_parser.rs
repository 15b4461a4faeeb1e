use scraper::{ElementRef, Selector};

use crate::domain::{MissingValue, Record, COLUMN_COUNT};

/// Visible text of one table cell and the first anchor href inside it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawCell {
    pub text: String,
    pub href: Option<String>,
}

impl RawCell {
    pub fn text(text: &str) -> Self {
        RawCell {
            text: text.to_string(),
            href: None,
        }
    }

    pub fn link(text: &str, href: &str) -> Self {
        RawCell {
            text: text.to_string(),
            href: Some(href.to_string()),
        }
    }

    pub fn from_element(cell: ElementRef<'_>, anchor: &Selector) -> Self {
        let href = cell
            .select(anchor)
            .find_map(|a| a.value().attr("href"))
            .map(|href| href.to_string());

        RawCell {
            text: cell.text().collect(),
            href,
        }
    }
}

/// Replace each run of `\r`/`\n` with one space, then trim.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_break = false;

    for ch in text.chars() {
        match ch {
            '\r' | '\n' => {
                if !in_break {
                    out.push(' ');
                    in_break = true;
                }
            }
            _ => {
                out.push(ch);
                in_break = false;
            }
        }
    }

    out.trim().to_string()
}

/// Turns the cells of one data row into a [`Record`].
///
/// Rows shorter than the ten expected columns are never an error: each
/// absent cell takes the configured [`MissingValue`]. The first cell only
/// contributes its anchor, which becomes `link` (site URL + href) or stays
/// empty.
#[derive(Debug, Clone)]
pub struct RowParser {
    site_url: String,
    missing: MissingValue,
}

impl RowParser {
    pub fn new(site_url: impl Into<String>, missing: MissingValue) -> Self {
        RowParser {
            site_url: site_url.into(),
            missing,
        }
    }

    pub fn parse(&self, cells: &[RawCell]) -> Record {
        if cells.len() < COLUMN_COUNT {
            log::debug!(
                "Short row with {} of {} cells, filling with '{}'",
                cells.len(),
                COLUMN_COUNT,
                self.missing.as_str()
            );
        }

        let link = cells
            .first()
            .and_then(|cell| cell.href.as_deref())
            .map(|href| format!("{}{}", self.site_url, href))
            .unwrap_or_default();

        let mut link = Some(link);
        let fields: [String; COLUMN_COUNT] = std::array::from_fn(|i| match i {
            0 => link.take().unwrap_or_default(),
            _ => match cells.get(i) {
                Some(cell) => clean_text(&cell.text),
                None => self.missing.as_str().to_string(),
            },
        });

        Record::from_fields(fields)
    }
}
