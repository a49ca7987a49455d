//! CSV table output
//!
//! One row per entry under the header `ARTWORK,DATE,SOURCE TITLE,SOURCE IMAGE`.
//! Image cells hold one `<src: {url}\nalt: {alt}>` token per image, each
//! followed by a newline.

use crate::model::{GalleryEntry, ImageRef};
use crate::storage::traits::{EntrySink, PersistenceError, PersistenceResult};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::mem::take;
use std::path::Path;

/// Column headers of the table
pub const HEADER: [&str; 4] = ["ARTWORK", "DATE", "SOURCE TITLE", "SOURCE IMAGE"];

const TOKEN_OPEN: &str = "<src: ";
const TOKEN_ALT: &str = "\nalt: ";
const TOKEN_CLOSE: char = '>';

/* ---------------- Image tokens ---------------- */

/// Formats an image list as newline-terminated `<src: …\nalt: …>` tokens
pub fn format_image_list(images: &[ImageRef]) -> String {
    let mut cell = String::new();
    for image in images {
        cell.push_str(&image.to_string());
        cell.push('\n');
    }
    cell
}

/// Parses a cell written by [`format_image_list`]
///
/// Exact for any URL without `\nalt: ` and any alt text without `>`.
pub fn parse_image_list(cell: &str) -> PersistenceResult<Vec<ImageRef>> {
    let mut images = Vec::new();
    let mut rest = cell;

    loop {
        rest = rest.trim_start_matches(['\n', '\r']);
        if rest.is_empty() {
            return Ok(images);
        }

        let body = rest.strip_prefix(TOKEN_OPEN).ok_or_else(|| {
            PersistenceError::Corrupt(format!("expected '{}' at {:?}", TOKEN_OPEN.trim(), rest))
        })?;
        let (src, after_src) = body.split_once(TOKEN_ALT).ok_or_else(|| {
            PersistenceError::Corrupt(format!("image token without alt: {:?}", rest))
        })?;
        let (alt, after_alt) = after_src.split_once(TOKEN_CLOSE).ok_or_else(|| {
            PersistenceError::Corrupt(format!("unterminated image token: {:?}", rest))
        })?;

        images.push(ImageRef::new(src, alt));
        rest = after_alt;
    }
}

/// The four cells of an entry's row
pub fn entry_row(entry: &GalleryEntry) -> [String; 4] {
    [
        format_image_list(&entry.artworks),
        entry.date.clone(),
        entry.source_title.clone(),
        format_image_list(&entry.source_images),
    ]
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Writes a single CSV row, CRLF terminated
pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S]) -> io::Result<()> {
    for (index, cell) in row.iter().enumerate() {
        if index > 0 {
            w.write_all(b",")?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\r\n")
}

/* ---------------- Parsing ---------------- */

/// Minimal CSV parser (quotes + CRLF tolerant)
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                rows.push(take(&mut row));
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

/* ---------------- Table file ---------------- */

/// An entries table being written to disk
pub struct CsvTable {
    writer: BufWriter<File>,
    rows: usize,
}

impl CsvTable {
    /// Truncates (or creates) `path` and writes the header row
    pub fn create(path: &Path) -> PersistenceResult<Self> {
        let mut table = Self::open(path)?;
        table.reset()?;
        Ok(table)
    }

    /// Opens (or creates) `path` for writing, leaving its content in place
    ///
    /// Nothing is written until [`CsvTable::reset`].
    pub fn open(path: &Path) -> PersistenceResult<Self> {
        let file = OpenOptions::new().write(true).create(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            rows: 0,
        })
    }

    /// Discards every row and writes the header
    pub fn reset(&mut self) -> PersistenceResult<()> {
        self.writer.flush()?;
        let file = self.writer.get_mut();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;

        write_row(&mut self.writer, &HEADER)?;
        self.writer.flush()?;
        self.rows = 0;
        Ok(())
    }
}

impl EntrySink for CsvTable {
    fn append(&mut self, entry: &GalleryEntry) -> PersistenceResult<()> {
        write_row(&mut self.writer, &entry_row(entry))?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn appended(&self) -> usize {
        self.rows
    }
}

/// Reads a table back into entries (header row skipped)
pub fn read_table(path: &Path) -> PersistenceResult<Vec<GalleryEntry>> {
    let text = std::fs::read_to_string(path)?;
    let mut rows = parse_rows(&text).into_iter();

    match rows.next() {
        Some(header) if header == HEADER => {}
        other => {
            return Err(PersistenceError::Corrupt(format!(
                "unexpected table header: {:?}",
                other
            )))
        }
    }

    rows.map(|row| {
        let [artworks, date, source_title, source_images]: [String; 4] =
            row.try_into().map_err(|row: Vec<String>| {
                PersistenceError::Corrupt(format!("expected 4 columns, got {}", row.len()))
            })?;
        Ok(GalleryEntry::new(
            parse_image_list(&artworks)?,
            date,
            source_title,
            parse_image_list(&source_images)?,
        ))
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_entry() -> GalleryEntry {
        GalleryEntry::new(
            vec![
                ImageRef::new("https://static.jojowiki.com/a.png", "Art, \"A\""),
                ImageRef::new("https://static.jojowiki.com/b.jpg", ""),
            ],
            "March 2023",
            "Ultra Jump, Issue 4",
            vec![ImageRef::new("https://static.jojowiki.com/cover.png", "Cover")],
        )
    }

    #[test]
    fn test_format_image_list() {
        let images = vec![ImageRef::new("a.png", "A"), ImageRef::new("b.png", "B")];
        assert_eq!(
            format_image_list(&images),
            "<src: a.png\nalt: A>\n<src: b.png\nalt: B>\n"
        );
        assert_eq!(format_image_list(&[]), "");
    }

    #[test]
    fn test_image_tokens_roundtrip() {
        let images = vec![
            ImageRef::new("https://static.jojowiki.com/images/a/ab/Art.png", "Art piece"),
            ImageRef::new("https://static.jojowiki.com/x.jpg?v=2", ""),
            ImageRef::new("b.png", "multi\nline alt"),
        ];
        assert_eq!(parse_image_list(&format_image_list(&images)).unwrap(), images);
    }

    #[test]
    fn test_parse_image_list_rejects_garbage() {
        assert!(matches!(
            parse_image_list("not a token"),
            Err(PersistenceError::Corrupt(_))
        ));
        assert!(parse_image_list("<src: a.png>").is_err());
        assert!(parse_image_list("<src: a.png\nalt: A").is_err());
    }

    #[test]
    fn test_write_row_quoting() {
        let mut buf = Vec::new();
        write_row(&mut buf, &["plain", "a,b", "say \"hi\"", "two\nlines"]).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "plain,\"a,b\",\"say \"\"hi\"\"\",\"two\nlines\"\r\n"
        );
    }

    #[test]
    fn test_parse_rows_quoted_newlines() {
        let rows = parse_rows("A,B\r\n\"x\ny\",\"q\"\"q\"\r\n,\r\n");
        assert_eq!(
            rows,
            vec![
                vec!["A".to_string(), "B".to_string()],
                vec!["x\ny".to_string(), "q\"q".to_string()],
                vec![String::new(), String::new()],
            ]
        );
    }

    #[test]
    fn test_header_only_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entries.csv");

        let table = CsvTable::create(&path).unwrap();
        assert_eq!(table.appended(), 0);
        drop(table);

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "ARTWORK,DATE,SOURCE TITLE,SOURCE IMAGE\r\n"
        );
        assert!(read_table(&path).unwrap().is_empty());
    }

    #[test]
    fn test_table_roundtrip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entries.csv");
        let entries = vec![
            sample_entry(),
            GalleryEntry::new(vec![], "2021", "Untitled", vec![]),
        ];

        let mut table = CsvTable::create(&path).unwrap();
        for entry in &entries {
            table.append(entry).unwrap();
        }
        assert_eq!(table.appended(), 2);

        assert_eq!(read_table(&path).unwrap(), entries);
    }

    #[test]
    fn test_create_truncates_previous_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entries.csv");

        let mut table = CsvTable::create(&path).unwrap();
        table.append(&sample_entry()).unwrap();
        drop(table);

        CsvTable::create(&path).unwrap();
        assert!(read_table(&path).unwrap().is_empty());
    }

    #[test]
    fn test_open_keeps_content_until_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("entries.csv");
        let mut table = CsvTable::create(&path).unwrap();
        table.append(&sample_entry()).unwrap();
        drop(table);
        let before = std::fs::read_to_string(&path).unwrap();

        let mut table = CsvTable::open(&path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);

        table.reset().unwrap();
        assert!(read_table(&path).unwrap().is_empty());
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("entries.csv");
        assert!(matches!(
            CsvTable::create(&path),
            Err(PersistenceError::Io(_))
        ));
    }
}
