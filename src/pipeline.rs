use std::io::{BufRead, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use csv::{StringRecord, Writer};
use tracing::{debug, info, warn};

use crate::config::ConvertOptions;
use crate::error::{ConvertError, Result};
use crate::output;
use crate::transformer::{convert, find_timestamp_column_index};

/// Counters for one finished pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionSummary {
    pub bytes_read: u64,
    pub rows_read: u64,
    pub rows_written: u64,
    pub elapsed: Duration,
}

/// Stream every record from `input` to `writer`, header first.
///
/// Blank lines are skipped by the csv reader: they are neither written nor
/// counted as stride positions.
pub fn convert_records<R: BufRead, W: Write>(
    mut input: R,
    writer: &mut Writer<W>,
    options: ConvertOptions,
) -> Result<ConversionSummary> {
    let start = Instant::now();
    let utf8_bom = output::has_utf8_bom(&mut input)?;
    let mut reader = output::reader_from(input);
    let mut records = reader.records();

    let mut header = records.next().ok_or(ConvertError::EmptyInput)??;
    if utf8_bom {
        header = restore_bom(&header);
    }
    let timestamp_index = match find_timestamp_column_index(&header) {
        Some(index) => index,
        None => {
            warn!(header = ?header, "no column name contains 'time'; using column 0");
            0
        }
    };
    debug!(timestamp_index, ?options, "starting conversion");

    let rows = records.map(|r| r.map_err(ConvertError::from));
    let mut conversion = convert(rows, header, timestamp_index, options);
    let mut rows_written = 0u64;
    for row in conversion.by_ref() {
        writer.write_record(&row?)?;
        rows_written += 1;
    }
    let rows_read = conversion.rows_read();
    drop(conversion);
    writer.flush()?;

    Ok(ConversionSummary {
        bytes_read: reader.position().byte(),
        rows_read,
        // header is not a data row
        rows_written: rows_written.saturating_sub(1),
        elapsed: start.elapsed(),
    })
}

/// The csv reader drops a leading BOM; put it back on the first header name
/// so the header is written out exactly as it was read.
fn restore_bom(header: &StringRecord) -> StringRecord {
    let mut out = StringRecord::with_capacity(header.as_slice().len() + 3, header.len());
    for (i, name) in header.iter().enumerate() {
        if i == 0 {
            out.push_field(&format!("\u{feff}{name}"));
        } else {
            out.push_field(name);
        }
    }
    out
}

/// Convert `input` into `output`. The input is opened before the output is
/// created; both are closed when this returns, on success or failure.
pub fn convert_file(input: &Path, output: &Path, options: ConvertOptions) -> Result<ConversionSummary> {
    let input = output::open_input(input)?;
    let mut writer = output::create_writer(output)?;
    convert_records(input, &mut writer, options)
}

/// Top-level boundary: any failure is printed with an `Error: ` prefix and
/// collapsed to `None`. A partially written output file is left in place.
pub fn process_log(
    input: &Path,
    output: &Path,
    options: ConvertOptions,
) -> Option<ConversionSummary> {
    match convert_file(input, output, options) {
        Ok(summary) => {
            info!(
                input = %input.display(),
                output = %output.display(),
                rows_read = summary.rows_read,
                rows_written = summary.rows_written,
                "conversion finished"
            );
            Some(summary)
        }
        Err(e) => {
            debug!(input = %input.display(), error = ?e, "conversion failed");
            println!("Error: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = "Time,Speed\n\
                          22-Feb-2021 10:00:00.100,50\n\
                          22-Feb-2021 10:00:01.200,55\n";

    fn run(input: &str, options: ConvertOptions) -> (Result<ConversionSummary>, String) {
        let mut writer = output::writer_from(Vec::new());
        let res = convert_records(input.as_bytes(), &mut writer, options);
        let bytes = writer.into_inner().unwrap();
        (res, String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn end_to_end_keeps_all_rows() {
        let (res, out) = run(SAMPLE, ConvertOptions::default());
        let summary = res.unwrap();
        assert_eq!(out, "Time,Speed\r\n10:00:00,50\r\n10:00:01,55\r\n");
        assert_eq!(summary.rows_read, 2);
        assert_eq!(summary.rows_written, 2);
        assert!(summary.bytes_read > 0);
    }

    #[test]
    fn retained_date_is_iso_like() {
        let opts = ConvertOptions {
            stride: 0,
            discard_date: false,
        };
        let (res, out) = run(SAMPLE, opts);
        res.unwrap();
        assert_eq!(
            out,
            "Time,Speed\r\n2021-02-22 10:00:00,50\r\n2021-02-22 10:00:01,55\r\n"
        );
    }

    #[test]
    fn header_is_copied_through_unchanged() {
        let input = "Device Time,\"GPS, Speed\",Engine RPM(rpm)\n\
                     22-Feb-2021 10:00:00.1,1,2\n";
        let (res, out) = run(input, ConvertOptions::default());
        res.unwrap();
        assert!(out.starts_with("Device Time,\"GPS, Speed\",Engine RPM(rpm)\r\n"));
    }

    #[test]
    fn bom_is_written_back_before_header() {
        let input = "\u{feff}Time,Speed\n22-Feb-2021 10:00:00.1,5\n";
        let (res, out) = run(input, ConvertOptions::default());
        res.unwrap();
        assert_eq!(out, "\u{feff}Time,Speed\r\n10:00:00,5\r\n");
    }

    #[test]
    fn bom_file_round_trips_header_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, b"\xEF\xBB\xBFDevice Time,Rpm\r\n22-Feb-2021 18:15:47.926,900\r\n").unwrap();

        process_log(&input, &output, ConvertOptions::default()).unwrap();
        let written = fs::read(&output).unwrap();
        assert!(written.starts_with(b"\xEF\xBB\xBFDevice Time,Rpm\r\n"));
        assert!(written.ends_with(b"18:15:47,900\r\n"));
    }

    #[test]
    fn blank_lines_are_skipped_and_not_counted() {
        let input = "Time,N\n\
                     22-Feb-2021 10:00:00.0,0\n\
                     \n\
                     22-Feb-2021 10:00:01.0,1\n\
                     22-Feb-2021 10:00:02.0,2\n";
        let opts = ConvertOptions {
            stride: 2,
            discard_date: true,
        };
        let (res, out) = run(input, opts);
        let summary = res.unwrap();
        assert_eq!(summary.rows_read, 3);
        assert_eq!(out, "Time,N\r\n10:00:01,1\r\n");
    }

    #[test]
    fn stride_three_keeps_two_thirds() {
        let mut input = String::from("Time,N\n");
        for i in 0..9 {
            input.push_str(&format!("22-Feb-2021 10:00:0{i}.0,{i}\n"));
        }
        let opts = ConvertOptions {
            stride: 3,
            discard_date: true,
        };
        let (res, out) = run(&input, opts);
        let summary = res.unwrap();
        assert_eq!(summary.rows_read, 9);
        assert_eq!(summary.rows_written, 6);
        let ns: Vec<&str> = out
            .lines()
            .skip(1)
            .map(|l| l.rsplit(',').next().unwrap())
            .collect();
        assert_eq!(ns, vec!["1", "2", "4", "5", "7", "8"]);
    }

    #[test]
    fn missing_time_column_treats_first_column_as_timestamp() {
        let input = "Stamp,Speed\n22-Feb-2021 10:00:00.9,50\n";
        let (res, out) = run(input, ConvertOptions::default());
        res.unwrap();
        assert_eq!(out, "Stamp,Speed\r\n10:00:00,50\r\n");
    }

    #[test]
    fn empty_input_fails() {
        let (res, out) = run("", ConvertOptions::default());
        assert!(matches!(res, Err(ConvertError::EmptyInput)));
        assert!(out.is_empty());
    }

    #[test]
    fn short_row_is_index_error() {
        let input = "Speed,Time\n50,22-Feb-2021 10:00:00.0\n55\n";
        let (res, _) = run(input, ConvertOptions::default());
        assert!(matches!(res, Err(ConvertError::Index { index: 1, len: 1 })));
    }

    #[test]
    fn converts_file_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, SAMPLE).unwrap();

        let summary = process_log(&input, &output, ConvertOptions::default()).unwrap();
        assert_eq!(summary.rows_written, 2);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Time,Speed\r\n10:00:00,50\r\n10:00:01,55\r\n"
        );
    }

    #[test]
    fn missing_input_does_not_create_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.csv");
        let res = convert_file(&dir.path().join("missing.csv"), &output, ConvertOptions::default());
        assert!(matches!(res, Err(ConvertError::FileOpen { .. })));
        assert!(!output.exists());
        assert!(process_log(&dir.path().join("missing.csv"), &output, ConvertOptions::default()).is_none());
    }

    #[test]
    fn failure_leaves_partial_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        let output = dir.path().join("out.csv");
        fs::write(&input, "Time,Speed\n22-Feb-2021 10:00:00.1,50\nbroken,55\n").unwrap();

        assert!(process_log(&input, &output, ConvertOptions::default()).is_none());
        // writer buffer is flushed on drop
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "Time,Speed\r\n10:00:00,50\r\n"
        );
    }
}
