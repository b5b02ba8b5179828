//! File exports: server-generated downloads and the local CSV fallback

/// UTF-8 byte order mark, so spreadsheet tools detect the encoding
pub const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

/// Content type of the local CSV export
pub const CSV_CONTENT_TYPE: &str = "text/csv;charset=utf-8;";
/// Content type when the server sends none
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A file ready to be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// Suggested file name
    pub filename: String,
    /// Media type of `bytes`
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl Download {
    /// Write the file into `dir`, returning its path.
    ///
    /// # Errors
    /// Returns the I/O error of the write.
    pub fn save_to(&self, dir: &std::path::Path) -> std::io::Result<std::path::PathBuf> {
        let name = std::path::Path::new(&self.filename)
            .file_name()
            .map_or_else(|| "download".into(), std::ffi::OsStr::to_os_string);
        let path = dir.join(name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// One CSV cell: quoted when it holds a quote, comma or newline.
#[must_use]
pub fn csv_cell(value: &str) -> String {
    if value.contains(['"', ',', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// BOM-prefixed CSV with a header line and one line per row.
#[must_use]
pub fn csv_document<R, C>(header: &[&str], rows: R) -> Vec<u8>
where
    R: IntoIterator<Item = C>,
    C: IntoIterator<Item = String>,
{
    let body = rows
        .into_iter()
        .map(|row| row.into_iter().map(|cell| csv_cell(&cell)).collect::<Vec<_>>().join(","))
        .collect::<Vec<_>>()
        .join("\n");

    let mut bytes = UTF8_BOM.to_vec();
    bytes.extend_from_slice(header.join(",").as_bytes());
    bytes.push(b'\n');
    bytes.extend_from_slice(body.as_bytes());
    bytes
}
