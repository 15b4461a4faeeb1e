use crate::domain::{Dataset, DatasetRow, Record};

/// Which text values count as null in the finished dataset. The empty string
/// always does; sentinels such as `N/A` only when listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NullPolicy {
    tokens: Vec<String>,
}

impl NullPolicy {
    pub fn new(tokens: impl IntoIterator<Item = String>) -> Self {
        NullPolicy {
            tokens: tokens.into_iter().filter(|t| !t.is_empty()).collect(),
        }
    }

    pub fn is_null(&self, value: &str) -> bool {
        value.is_empty() || self.tokens.iter().any(|t| t == value)
    }

    fn apply(&self, value: String) -> Option<String> {
        match self.is_null(&value) {
            true => None,
            false => Some(value),
        }
    }
}

/// Text to number, `None` for anything that is not a finite number.
pub fn coerce_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

#[derive(Debug, Clone, Default)]
pub struct DatasetAssembler {
    nulls: NullPolicy,
}

impl DatasetAssembler {
    pub fn new(nulls: NullPolicy) -> Self {
        DatasetAssembler { nulls }
    }

    /// Keeps every record, in order. Nothing is sorted, merged or dropped.
    pub fn assemble(&self, records: impl IntoIterator<Item = Record>) -> Dataset {
        let rows: Vec<DatasetRow> = records.into_iter().map(|r| self.finalize(r)).collect();

        let unparsed = rows.iter().filter(|r| r.reported.is_none()).count();
        if unparsed > 0 {
            log::debug!("{} of {} rows have no numeric Reported value", unparsed, rows.len());
        }

        Dataset::new(rows)
    }

    fn finalize(&self, record: Record) -> DatasetRow {
        let reported = match self.nulls.is_null(&record.reported) {
            true => None,
            false => coerce_number(&record.reported),
        };

        DatasetRow {
            link: self.nulls.apply(record.link),
            date: self.nulls.apply(record.date),
            city: self.nulls.apply(record.city),
            state: self.nulls.apply(record.state),
            country: self.nulls.apply(record.country),
            shape: self.nulls.apply(record.shape),
            summary: self.nulls.apply(record.summary),
            reported,
            media: self.nulls.apply(record.media),
            explanation: self.nulls.apply(record.explanation),
        }
    }
}
