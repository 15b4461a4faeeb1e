use super::record::{COLUMNS, COLUMN_COUNT, REPORTED_COLUMN};

/// One finalized row. `None` marks a null, which is distinct from any text.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetRow {
    pub link: Option<String>,
    pub date: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub shape: Option<String>,
    pub summary: Option<String>,
    pub reported: Option<f64>,
    pub media: Option<String>,
    pub explanation: Option<String>,
}

impl DatasetRow {
    /// Render each column for export; nulls become empty cells.
    pub fn to_cells(&self) -> [String; COLUMN_COUNT] {
        let text = |v: &Option<String>| v.clone().unwrap_or_default();

        [
            text(&self.link),
            text(&self.date),
            text(&self.city),
            text(&self.state),
            text(&self.country),
            text(&self.shape),
            text(&self.summary),
            self.reported.map(|n| n.to_string()).unwrap_or_default(),
            text(&self.media),
            text(&self.explanation),
        ]
    }

    /// Inverse of [`DatasetRow::to_cells`]: empty cells read back as null.
    pub fn from_cells(cells: [Option<String>; COLUMN_COUNT]) -> Self {
        let [link, date, city, state, country, shape, summary, reported, media, explanation] =
            cells;

        DatasetRow {
            link,
            date,
            city,
            state,
            country,
            shape,
            summary,
            reported: reported.and_then(|r| r.trim().parse::<f64>().ok()),
            media,
            explanation,
        }
    }

    pub fn is_null(&self, column: usize) -> bool {
        match column {
            0 => self.link.is_none(),
            1 => self.date.is_none(),
            2 => self.city.is_none(),
            3 => self.state.is_none(),
            4 => self.country.is_none(),
            5 => self.shape.is_none(),
            6 => self.summary.is_none(),
            REPORTED_COLUMN => self.reported.is_none(),
            8 => self.media.is_none(),
            9 => self.explanation.is_none(),
            _ => true,
        }
    }
}

/// Ordered rows in encounter order, plus the fixed column header.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn new(rows: Vec<DatasetRow>) -> Self {
        Dataset { rows }
    }

    pub fn columns(&self) -> &'static [&'static str; COLUMN_COUNT] {
        &COLUMNS
    }

    pub fn rows(&self) -> &[DatasetRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn null_count(&self, column: usize) -> usize {
        self.rows.iter().filter(|r| r.is_null(column)).count()
    }
}
