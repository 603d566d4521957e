//! Input loading and output helpers.
//!
//! The whole input file is read into memory and decoded with `encoding_rs`
//! (UTF-8 unless configured otherwise). The `-` path reads standard input.

use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::debug;

use crate::error::{LoaderError, LoaderResult};

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> LoaderResult<&'static Encoding> {
    match label {
        Some(value) => Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| LoaderError::UnknownEncoding(value.to_string())),
        None => Ok(UTF_8),
    }
}

pub fn read_input(path: &Path, encoding: &'static Encoding) -> LoaderResult<String> {
    let mut bytes = Vec::new();
    let read = if is_dash(path) {
        io::stdin().lock().read_to_end(&mut bytes)
    } else {
        File::open(path).and_then(|mut file| file.read_to_end(&mut bytes))
    };
    read.map_err(|source| LoaderError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} byte(s) from {:?}", bytes.len(), path);
    decode_bytes(path, &bytes, encoding)
}

pub fn decode_bytes(path: &Path, bytes: &[u8], encoding: &'static Encoding) -> LoaderResult<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(LoaderError::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name(),
        })
    } else {
        Ok(text.into_owned())
    }
}

pub fn stdout_csv_writer() -> csv::Writer<Box<dyn Write>> {
    let sink: Box<dyn Write> = Box::new(BufWriter::new(io::stdout()));
    csv::WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true)
        .from_writer(sink)
}
