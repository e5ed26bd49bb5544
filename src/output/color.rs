use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::{CompactFormatter, Formatter, PrettyFormatter};
use serde_json::Value;

use crate::error::JpqError;

const RESET: &[u8] = b"\x1b[0m";
const KEY: &[u8] = b"\x1b[1;34m";
const STRING: &[u8] = b"\x1b[0;32m";
const NUMBER: &[u8] = b"\x1b[0;36m";
const BOOL: &[u8] = b"\x1b[0;33m";
const NULL: &[u8] = b"\x1b[0;31m";
const PUNCT: &[u8] = b"\x1b[1;37m";

/// Wraps a serde_json formatter and paints each token by kind.
struct Painter<F> {
    inner: F,
    in_key: bool,
}

impl<F: Formatter> Painter<F> {
    fn new(inner: F) -> Self {
        Painter {
            inner,
            in_key: false,
        }
    }
}

fn paint<W, T>(writer: &mut W, color: &[u8], body: T) -> io::Result<()>
where
    W: ?Sized + Write,
    T: FnOnce(&mut W) -> io::Result<()>,
{
    writer.write_all(color)?;
    body(writer)?;
    writer.write_all(RESET)
}

impl<F: Formatter> Formatter for Painter<F> {
    fn write_null<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        paint(writer, NULL, |w| self.inner.write_null(w))
    }

    fn write_bool<W: ?Sized + Write>(&mut self, writer: &mut W, value: bool) -> io::Result<()> {
        paint(writer, BOOL, |w| self.inner.write_bool(w, value))
    }

    fn write_i64<W: ?Sized + Write>(&mut self, writer: &mut W, value: i64) -> io::Result<()> {
        paint(writer, NUMBER, |w| self.inner.write_i64(w, value))
    }

    fn write_u64<W: ?Sized + Write>(&mut self, writer: &mut W, value: u64) -> io::Result<()> {
        paint(writer, NUMBER, |w| self.inner.write_u64(w, value))
    }

    fn write_f64<W: ?Sized + Write>(&mut self, writer: &mut W, value: f64) -> io::Result<()> {
        paint(writer, NUMBER, |w| self.inner.write_f64(w, value))
    }

    fn begin_string<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(if self.in_key { KEY } else { STRING })?;
        self.inner.begin_string(writer)
    }

    fn end_string<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_string(writer)?;
        writer.write_all(RESET)
    }

    fn begin_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        paint(writer, PUNCT, |w| self.inner.begin_array(w))
    }

    fn end_array<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        paint(writer, PUNCT, |w| self.inner.end_array(w))
    }

    fn begin_array_value<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.inner.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        paint(writer, PUNCT, |w| self.inner.begin_object(w))
    }

    fn end_object<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        paint(writer, PUNCT, |w| self.inner.end_object(w))
    }

    fn begin_object_key<W: ?Sized + Write>(
        &mut self,
        writer: &mut W,
        first: bool,
    ) -> io::Result<()> {
        self.in_key = true;
        self.inner.begin_object_key(writer, first)
    }

    fn end_object_key<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.in_key = false;
        self.inner.end_object_key(writer)
    }

    fn begin_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.inner.end_object_value(writer)
    }
}

fn render<F: Formatter>(value: &Value, formatter: F) -> Result<String, JpqError> {
    let mut buf = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, Painter::new(formatter));
    value
        .serialize(&mut ser)
        .map_err(|e| JpqError::Parse(e.to_string()))?;
    String::from_utf8(buf).map_err(|e| JpqError::Parse(e.to_string()))
}

/// Serialize `value` as JSON with ANSI colours, pretty-printed unless `compact`.
pub fn colorize_json(value: &Value, compact: bool) -> Result<String, JpqError> {
    if compact {
        render(value, CompactFormatter)
    } else {
        render(value, PrettyFormatter::new())
    }
}
