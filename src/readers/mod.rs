pub mod dataset_reader;
pub mod template_reader;

pub use dataset_reader::{discover_complementary_files, discover_day_files, DatasetReader};
pub use template_reader::TemplateReader;

use std::fs;
use std::path::Path;

use crate::error::Result;

/// Read a document as text. Files exported from spreadsheets are routinely
/// Windows-1252; transcode when UTF-8 validation fails.
pub(crate) fn read_document(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(err) => {
            let bytes = err.into_bytes();
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}
