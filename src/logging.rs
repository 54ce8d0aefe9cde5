// tracing subscriber that writes formatted lines to the browser console.

use std::borrow::Cow;
use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Buffers one formatted event and emits it on drop at the event's level.
pub struct ConsoleWriter {
    level: Level,
    buffer: Vec<u8>,
}

impl ConsoleWriter {
    fn new(level: Level) -> Self {
        ConsoleWriter {
            level,
            buffer: Vec::new(),
        }
    }

    fn line(&self) -> Cow<'_, str> {
        match String::from_utf8_lossy(&self.buffer) {
            Cow::Borrowed(s) => Cow::Borrowed(s.trim_end()),
            Cow::Owned(s) => Cow::Owned(s.trim_end().to_string()),
        }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        if !self.buffer.is_empty() {
            emit(self.level, &self.line());
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn emit(level: Level, line: &str) {
    let line = wasm_bindgen::JsValue::from_str(line);
    match level {
        Level::ERROR => web_sys::console::error_1(&line),
        Level::WARN => web_sys::console::warn_1(&line),
        Level::INFO => web_sys::console::info_1(&line),
        _ => web_sys::console::debug_1(&line),
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn emit(_level: Level, line: &str) {
    eprintln!("{}", line);
}

/// [`MakeWriter`] routing each event to the console method of its level.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        ConsoleWriter::new(Level::INFO)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        ConsoleWriter::new(*meta.level())
    }
}

/// Install the global subscriber. Returns false if one is already set.
pub fn init(max_level: Level) -> bool {
    tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter)
        .with_max_level(max_level)
        .with_target(false)
        .without_time()
        .try_init()
        .is_ok()
}
