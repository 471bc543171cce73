use csv::StringRecord;

use crate::config::ConvertOptions;
use crate::error::{ConvertError, Result};
use crate::timestamp::reformat_datetime;

const TIMESTAMP_MARKER: &str = "time";

/// Index of the first column whose name contains "time", any case.
pub fn find_timestamp_column_index(header: &StringRecord) -> Option<usize> {
    header
        .iter()
        .position(|name| name.to_lowercase().contains(TIMESTAMP_MARKER))
}

/// Copy of `row` with the timestamp field reformatted.
pub fn transform_row(
    row: &StringRecord,
    timestamp_index: usize,
    discard_date: bool,
) -> Result<StringRecord> {
    if timestamp_index >= row.len() {
        return Err(ConvertError::Index {
            index: timestamp_index,
            len: row.len(),
        });
    }

    let mut out = StringRecord::with_capacity(row.as_slice().len(), row.len());
    for (i, field) in row.iter().enumerate() {
        if i == timestamp_index {
            out.push_field(&reformat_datetime(field, discard_date)?);
        } else {
            out.push_field(field);
        }
    }
    Ok(out)
}

/// Stride policy. Positions divisible by `stride` are the ones dropped.
#[inline]
pub fn keep_row(position: u64, stride: i64) -> bool {
    if stride > 1 {
        position % stride as u64 != 0
    } else {
        true
    }
}

/// Lazy conversion: yields the header untouched, then every kept data row
/// transformed. The first error is yielded and ends the stream.
pub fn convert<I>(
    rows: I,
    header: StringRecord,
    timestamp_index: usize,
    options: ConvertOptions,
) -> Conversion<I::IntoIter>
where
    I: IntoIterator<Item = Result<StringRecord>>,
{
    Conversion {
        rows: rows.into_iter(),
        header: Some(header),
        timestamp_index,
        options,
        position: 0,
        failed: false,
    }
}

pub struct Conversion<I> {
    rows: I,
    header: Option<StringRecord>,
    timestamp_index: usize,
    options: ConvertOptions,
    position: u64,
    failed: bool,
}

impl<I> Conversion<I> {
    /// Data rows consumed from the input so far.
    pub fn rows_read(&self) -> u64 {
        self.position
    }
}

impl<I> Iterator for Conversion<I>
where
    I: Iterator<Item = Result<StringRecord>>,
{
    type Item = Result<StringRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(header) = self.header.take() {
            return Some(Ok(header));
        }
        if self.failed {
            return None;
        }

        loop {
            let row = match self.rows.next()? {
                Ok(row) => row,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };
            let position = self.position;
            self.position += 1;

            if !keep_row(position, self.options.stride) {
                continue;
            }

            let out = transform_row(&row, self.timestamp_index, self.options.discard_date);
            self.failed = out.is_err();
            return Some(out);
        }
    }
}
