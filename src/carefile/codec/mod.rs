//! # Mapping Protocol
//!
//! Converts between typed entities and the flat rows of a Collection File.
//!
//! Each entity type gets one [`Mapper`]: a header plus a pair of plain
//! functions. Mappers carry no state and are declared as `const` items in
//! [`mappers`], then handed to the generic [`Repository`](crate::repo::Repository).
//!
//! ## Row Format
//!
//! ```text
//! id,name,stock,lowStockAlert,createdAt,updatedAt
//! M1,Paracetamol,100,20,2024-01-01T00:00:00,2024-01-01T00:00:00
//! ```
//!
//! - Fields are positional and separated by `,`. There is no quoting.
//! - Integers are written in decimal.
//! - Enumerations are written as their canonical label (`Pending`, not `0`).
//! - Timestamps use [`TIMESTAMP_FORMAT`].
//!
//! ## Lossy Free Text
//!
//! Free-text fields go through [`escape_text`] on the way out: every `,` becomes
//! `;` and line breaks become spaces. Nothing is restored on the way back in, so
//! `"Smith, John"` is read back as `"Smith; John"`. Every other field survives a
//! round trip unchanged.
//!
//! ## Decoding
//!
//! [`Fields`] checks the field count against the header before anything else,
//! then hands out fields in header order. Any parse failure rejects the whole
//! row with a [`DecodeError`]; there is no partial decode.

use crate::error::DecodeError;
use crate::model::{Label, Record};
use crate::store::Row;
use chrono::NaiveDateTime;
use std::fmt::Display;
use std::str::FromStr;

pub mod mappers;

pub use mappers::{
    ACCOUNTS, APPOINTMENTS, DOCTORS, MEDICINES, MEDICINE_REQUESTS, PATIENTS, PHARMACISTS,
};

/// Canonical, lexically sortable timestamp form.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Written in place of the delimiter inside free text.
pub const DELIMITER_SUBSTITUTE: char = ';';

/// Makes free text safe for a single fixed-arity row.
pub fn escape_text(value: &str) -> String {
    value
        .replace(crate::store::DELIMITER, &DELIMITER_SUBSTITUTE.to_string())
        .replace(['\n', '\r'], " ")
}

pub fn render_timestamp(value: &NaiveDateTime) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT).ok()
}

/// Encode/decode pair for one entity type.
pub struct Mapper<T> {
    pub collection: crate::model::Collection,
    pub header: &'static [&'static str],
    pub encode: fn(&T) -> Row,
    pub decode: fn(&mut Fields<'_>) -> Result<T, DecodeError>,
}

impl<T> Clone for Mapper<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Mapper<T> {}

impl<T> Mapper<T> {
    pub fn encode(&self, entity: &T) -> Row {
        (self.encode)(entity)
    }

    pub fn decode(&self, row: &Row) -> Result<T, DecodeError> {
        let mut fields = Fields::split(row.as_str(), self.header)?;
        (self.decode)(&mut fields)
    }

    pub fn header_line(&self) -> String {
        self.header.join(",")
    }
}

/// Positional reader over one row, checked against a header.
pub struct Fields<'a> {
    header: &'static [&'static str],
    values: Vec<&'a str>,
    next: usize,
}

impl<'a> Fields<'a> {
    pub fn split(line: &'a str, header: &'static [&'static str]) -> Result<Self, DecodeError> {
        let values: Vec<&'a str> = line.split(crate::store::DELIMITER).collect();
        if values.len() != header.len() {
            return Err(DecodeError::FieldCount {
                expected: header.len(),
                found: values.len(),
            });
        }
        Ok(Self {
            header,
            values,
            next: 0,
        })
    }

    fn take(&mut self) -> (&'static str, &'a str) {
        // Arity was checked in `split`; reading past the end is a mapper bug.
        let column = self.header[self.next];
        let value = self.values[self.next];
        self.next += 1;
        (column, value)
    }

    pub fn text(&mut self) -> String {
        self.take().1.to_string()
    }

    pub fn integer<N: FromStr>(&mut self) -> Result<N, DecodeError> {
        let (column, value) = self.take();
        value
            .trim()
            .parse()
            .map_err(|_| DecodeError::InvalidInteger {
                column,
                value: value.to_string(),
            })
    }

    pub fn label<L: Label>(&mut self) -> Result<L, DecodeError> {
        let (column, value) = self.take();
        L::from_label(value.trim()).ok_or_else(|| DecodeError::InvalidLabel {
            column,
            value: value.to_string(),
        })
    }

    pub fn timestamp(&mut self) -> Result<NaiveDateTime, DecodeError> {
        let (column, value) = self.take();
        parse_timestamp(value).ok_or_else(|| DecodeError::InvalidTimestamp {
            column,
            value: value.to_string(),
        })
    }

    /// Reads the trailing `createdAt,updatedAt` pair.
    pub fn record(&mut self, id: String) -> Result<Record, DecodeError> {
        let created_at = self.timestamp()?;
        let updated_at = self.timestamp()?;
        Ok(Record::restore(id, created_at, updated_at))
    }
}

/// Builds a row field by field.
#[derive(Debug, Default)]
pub struct RowWriter {
    fields: Vec<String>,
}

impl RowWriter {
    /// Starts a row with the record identifier.
    pub fn start(record: &Record) -> Self {
        let mut writer = Self::default();
        writer.fields.push(escape_text(&record.id));
        writer
    }

    pub fn text(mut self, value: &str) -> Self {
        self.fields.push(escape_text(value));
        self
    }

    pub fn integer(mut self, value: impl Display) -> Self {
        self.fields.push(value.to_string());
        self
    }

    pub fn label<L: Label>(mut self, value: L) -> Self {
        self.fields.push(value.label().to_string());
        self
    }

    pub fn timestamp(mut self, value: &NaiveDateTime) -> Self {
        self.fields.push(render_timestamp(value));
        self
    }

    /// Closes the row with the record timestamps.
    pub fn finish(self, record: &Record) -> Row {
        let writer = self
            .timestamp(&record.created_at)
            .timestamp(&record.updated_at);
        Row::from_fields(writer.fields)
    }
}
