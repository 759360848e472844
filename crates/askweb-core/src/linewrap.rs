//! Column-counting line wrapper for terminal output.
//!
//! The wrapper is byte oriented and keeps its column across calls, so text can
//! be fed in arbitrary fragments and still wrap exactly as if it had been
//! written in one piece. Wrapping is not word aware: a newline is emitted only
//! when a space pushes the column to `max_width`.

use std::io::{self, Write};

#[derive(Debug, Clone)]
pub struct LineWrapper {
    max_width: usize,
    tab_width: usize,
    column: usize,
    // A space seen at column 0 is only written when the following byte is also
    // a space, so its fate is decided when the next byte arrives.
    held_space: bool,
}

impl LineWrapper {
    pub fn new(max_width: usize, tab_width: usize) -> Self {
        Self {
            max_width: max_width.max(1),
            tab_width,
            column: 0,
            held_space: false,
        }
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// Current output column (a held leading space is not counted yet).
    pub fn column(&self) -> usize {
        self.column
    }

    /// Transform the next fragment of the stream.
    pub fn wrap(&mut self, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() + data.len() / self.max_width + 1);
        for &byte in data {
            if self.held_space {
                self.held_space = false;
                self.resolve_leading_space(byte == b' ', &mut out);
            }
            self.push(byte, &mut out);
        }
        out
    }

    /// Flush state at the end of the stream. A held leading space with nothing
    /// after it is dropped, though it still counts towards the column.
    pub fn finish(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.held_space {
            self.held_space = false;
            self.resolve_leading_space(false, &mut out);
        }
        out
    }

    fn push(&mut self, byte: u8, out: &mut Vec<u8>) {
        match byte {
            b'\n' => {
                out.push(b'\n');
                self.column = 0;
            }
            b'\t' => {
                out.extend(std::iter::repeat_n(b' ', self.tab_width));
                self.column += self.tab_width;
            }
            b' ' if self.column == 0 => self.held_space = true,
            b' ' => {
                out.push(b' ');
                self.advance_space(out);
            }
            other => {
                out.push(other);
                self.column += 1;
            }
        }
    }

    fn resolve_leading_space(&mut self, next_is_space: bool, out: &mut Vec<u8>) {
        if next_is_space {
            out.push(b' ');
        }
        self.advance_space(out);
    }

    fn advance_space(&mut self, out: &mut Vec<u8>) {
        self.column += 1;
        if self.column >= self.max_width {
            out.push(b'\n');
            self.column = 0;
        }
    }
}

/// [`Write`] adapter that wraps everything written through it.
pub struct LineWrapWriter<W: Write> {
    inner: W,
    wrapper: LineWrapper,
}

impl<W: Write> LineWrapWriter<W> {
    pub fn new(inner: W, max_width: usize, tab_width: usize) -> Self {
        Self {
            inner,
            wrapper: LineWrapper::new(max_width, tab_width),
        }
    }

    /// Resolve any held state and hand back the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        let tail = self.wrapper.finish();
        self.inner.write_all(&tail)?;
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for LineWrapWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let wrapped = self.wrapper.wrap(buf);
        self.inner.write_all(&wrapped)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Wrap a complete string in one go.
pub fn wrap_str(text: &str, max_width: usize, tab_width: usize) -> String {
    let mut wrapper = LineWrapper::new(max_width, tab_width);
    let mut out = wrapper.wrap(text.as_bytes());
    out.extend(wrapper.finish());
    String::from_utf8_lossy(&out).into_owned()
}
