use std::fmt;

/// Field separator of every Collection File. The format has no quoting.
pub const DELIMITER: char = ',';

/// One data line of a Collection File, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Row(String);

impl Row {
    pub fn new(line: impl Into<String>) -> Self {
        let mut line = line.into();
        while line.ends_with(['\n', '\r']) {
            line.pop();
        }
        Self(line)
    }

    /// Joins already-escaped fields with the delimiter.
    pub fn from_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut line = String::new();
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                line.push(DELIMITER);
            }
            line.push_str(field.as_ref());
        }
        Self(line)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn fields(&self) -> Vec<&str> {
        self.0.split(DELIMITER).collect()
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.0.split(DELIMITER).nth(index)
    }

    pub fn field_count(&self) -> usize {
        self.0.split(DELIMITER).count()
    }

    /// The identifier column, trimmed.
    pub fn key(&self) -> &str {
        self.field(0).unwrap_or_default().trim()
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

/// One data line exactly as it sits on disk, terminator included.
///
/// Rewrites copy untouched lines back from `bytes`, so blank lines, `\r\n`
/// endings and lines that are not valid UTF-8 survive an update of a
/// neighbouring row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    number: usize,
    bytes: Vec<u8>,
    row: Option<Row>,
}

impl Line {
    pub(super) fn parse(number: usize, bytes: &[u8]) -> Self {
        let row = std::str::from_utf8(bytes).ok().map(Row::from);
        Self {
            number,
            bytes: bytes.to_vec(),
            row,
        }
    }

    /// 1-based position in the file; the header is line 1.
    pub fn number(&self) -> usize {
        self.number
    }

    /// The line as text, or `None` when it is not valid UTF-8.
    pub fn row(&self) -> Option<&Row> {
        self.row.as_ref()
    }

    pub fn into_row(self) -> Option<Row> {
        self.row
    }

    pub fn is_blank(&self) -> bool {
        self.row.as_ref().is_some_and(Row::is_blank)
    }

    /// The key for diagnostics. Unreadable bytes are replaced.
    pub fn key(&self) -> String {
        match &self.row {
            Some(row) => row.key().to_string(),
            None => {
                let text = String::from_utf8_lossy(&self.bytes);
                text.split(DELIMITER)
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            }
        }
    }

    pub(super) fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The line break this line ended with; empty for an unterminated last line.
    pub(super) fn terminator(&self) -> &'static str {
        if self.bytes.ends_with(b"\r\n") {
            "\r\n"
        } else if self.bytes.ends_with(b"\n") {
            "\n"
        } else {
            ""
        }
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Row {
    fn from(value: &str) -> Self {
        Row::new(value)
    }
}

impl From<String> for Row {
    fn from(value: String) -> Self {
        Row::new(value)
    }
}
