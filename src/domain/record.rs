use std::{fmt, str::FromStr};

use serde::Deserialize;

pub const COLUMN_COUNT: usize = 10;

/// Export header, in table column order.
pub const COLUMNS: [&str; COLUMN_COUNT] = [
    "link",
    "Date",
    "City",
    "State",
    "Country",
    "Shape",
    "Summary",
    "Reported",
    "Media",
    "Explanation",
];

/// Index of the `Reported` column, the only one coerced to a number.
pub const REPORTED_COLUMN: usize = 7;

/// Placeholder written into a field whose cell is absent from the row.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingValue {
    #[default]
    Empty,
    #[serde(alias = "n/a")]
    Na,
}

impl MissingValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingValue::Empty => "",
            MissingValue::Na => "N/A",
        }
    }
}

impl FromStr for MissingValue {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "empty" | "" => Ok(MissingValue::Empty),
            "na" | "n/a" => Ok(MissingValue::Na),
            other => Err(format!("Unknown missing value: {}", other)),
        }
    }
}

impl fmt::Display for MissingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingValue::Empty => write!(f, "empty"),
            MissingValue::Na => write!(f, "na"),
        }
    }
}

/// One normalized sighting row. Every field is always populated, with the
/// configured [`MissingValue`] standing in for absent cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub link: String,
    pub date: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub shape: String,
    pub summary: String,
    pub reported: String,
    pub media: String,
    pub explanation: String,
}

impl Record {
    pub fn from_fields(fields: [String; COLUMN_COUNT]) -> Self {
        let [link, date, city, state, country, shape, summary, reported, media, explanation] =
            fields;

        Record {
            link,
            date,
            city,
            state,
            country,
            shape,
            summary,
            reported,
            media,
            explanation,
        }
    }

    pub fn fields(&self) -> [&str; COLUMN_COUNT] {
        [
            &self.link,
            &self.date,
            &self.city,
            &self.state,
            &self.country,
            &self.shape,
            &self.summary,
            &self.reported,
            &self.media,
            &self.explanation,
        ]
    }

    pub fn into_fields(self) -> [String; COLUMN_COUNT] {
        [
            self.link,
            self.date,
            self.city,
            self.state,
            self.country,
            self.shape,
            self.summary,
            self.reported,
            self.media,
            self.explanation,
        ]
    }
}
