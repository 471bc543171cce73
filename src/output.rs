use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;

use csv::{Reader, ReaderBuilder, Terminator, Writer, WriterBuilder};

use crate::error::{ConvertError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reader over raw records. The header is read as an ordinary first record
/// so it can be copied through byte for byte.
pub fn reader_from<R: Read>(rdr: R) -> Reader<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(rdr)
}

/// Writer using the default dialect: comma, minimal quoting, CRLF.
pub fn writer_from<W: Write>(wtr: W) -> Writer<W> {
    WriterBuilder::new()
        .flexible(true)
        .terminator(Terminator::CRLF)
        .from_writer(wtr)
}

/// Peek for a UTF-8 byte-order mark without consuming it. The csv reader
/// strips it from the first record, so callers put it back themselves.
pub fn has_utf8_bom<R: BufRead>(rdr: &mut R) -> io::Result<bool> {
    Ok(rdr.fill_buf()?.starts_with(UTF8_BOM))
}

pub fn open_input(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|source| ConvertError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

pub fn create_writer(path: &Path) -> Result<Writer<File>> {
    let file = File::create(path).map_err(|source| ConvertError::FileOpen {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(writer_from(file))
}
