//! Formatting of decoded events into text lines and writing them to output sinks
//!
//! A record line is `<TYPE>_<DIR>(<bus>.<endpoint>):` left justified to [`PREFIX_WIDTH`], setup fields for
//! control transfers, the hex payload and the relative time:
//!
//! ```text
//! CTRL_IN(0.0): c0:01:0000:0000:0102030405 # 0.0001230000000000
//! BULK_OUT(0.2):55534243 # 0.0000070000000000
//! # GET DESCRIPTOR Request DEVICE
//! ```
use colored::*;
use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, ErrorKind, Result};
use crate::usb::{Direction, SetupPacket, TransferType};

/// Width the `TYPE_DIR(bus.ep):` prefix is padded to
pub const PREFIX_WIDTH: usize = 14;
/// Rendered in place of the bus in the prefix; the capture is already for one device
pub const BUS_PLACEHOLDER: u8 = 0;
/// Fractional digits of the relative time
pub const TIME_PRECISION: usize = 16;

/// Informational line in place of a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// GET_DESCRIPTOR(DEVICE) request suppressed
    DescriptorRequest,
    /// Response to the GET_DESCRIPTOR(DEVICE) request suppressed
    DescriptorResponse,
    /// Payload over the size ceiling
    PayloadOmitted,
    /// Transfer type code that is not iso, interrupt, control or bulk
    UnknownTransferType(u8),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Notice::DescriptorRequest => write!(f, "GET DESCRIPTOR Request DEVICE"),
            Notice::DescriptorResponse => write!(f, "GET DESCRIPTOR Response DEVICE"),
            Notice::PayloadOmitted => write!(f, "Large data block omitted"),
            Notice::UnknownTransferType(t) => {
                write!(f, "Unknown transfer type 0x{:02x} omitted", t)
            }
        }
    }
}

/// Decoded transfer ready for output
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Transfer type
    pub transfer_type: TransferType,
    /// Transfer direction
    pub direction: Direction,
    /// Endpoint number without direction bit
    pub endpoint: u8,
    /// Setup fields; `Some` for control transfers only
    pub setup: Option<SetupPacket>,
    /// Hex encoded payload
    pub payload: String,
    /// Seconds since the previous event of the device
    pub delta: f64,
}

impl Record {
    /// `TYPE_DIR(bus.ep):` before padding
    pub fn prefix(&self) -> String {
        format!(
            "{}_{}({}.{}):",
            self.transfer_type, self.direction, BUS_PLACEHOLDER, self.endpoint
        )
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:<width$}", self.prefix(), width = PREFIX_WIDTH)?;
        if let Some(setup) = self.setup {
            write!(f, "{}", setup)?;
        }
        write!(
            f,
            "{} # {:.prec$}",
            self.payload,
            self.delta,
            prec = TIME_PRECISION
        )
    }
}

/// One line of output for an event
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Informational line, rendered with a leading `# `
    Notice(Notice),
    /// Formatted transfer
    Record(Record),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Output::Notice(n) => write!(f, "# {}", n),
            Output::Record(r) => write!(f, "{}", r),
        }
    }
}

/// Destination for output lines
pub trait Sink {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    /// Write `line` followed by a newline, unbuffered
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Write a decoded [`Output`]; default is its plain text
    fn write_output(&mut self, output: &Output) -> io::Result<()> {
        self.write_line(&output.to_string())
    }
}

/// Interactive output, normally stdout; can colour notices
#[derive(Debug)]
pub struct ConsoleSink<W: Write = io::Stdout> {
    writer: W,
    colour: bool,
}

impl ConsoleSink<io::Stdout> {
    /// Sink on process stdout
    pub fn stdout(colour: bool) -> Self {
        ConsoleSink::new(io::stdout(), colour)
    }
}

impl<W: Write> ConsoleSink<W> {
    /// Sink writing to `writer`
    pub fn new(writer: W, colour: bool) -> Self {
        ConsoleSink { writer, colour }
    }

    /// The inner writer
    pub fn get_ref(&self) -> &W {
        &self.writer
    }
}

impl<W: Write> Sink for ConsoleSink<W> {
    fn name(&self) -> &str {
        "console"
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()
    }

    fn write_output(&mut self, output: &Output) -> io::Result<()> {
        match output {
            Output::Notice(_) if self.colour => {
                self.write_line(&output.to_string().bright_black().to_string())
            }
            _ => self.write_line(&output.to_string()),
        }
    }
}

/// Durable copy of the output in a log file; never coloured
#[derive(Debug)]
pub struct FileSink<W: Write = File> {
    writer: W,
    name: String,
}

impl FileSink<File> {
    /// Create or truncate the log file at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| {
            Error::new(
                ErrorKind::Opening,
                &format!("Couldn't open log {}: {}", path.display(), e),
            )
        })?;
        Ok(FileSink::new(file, &path.display().to_string()))
    }
}

impl<W: Write> FileSink<W> {
    /// Sink writing to `writer`, named `name` in diagnostics
    pub fn new(writer: W, name: &str) -> Self {
        FileSink {
            writer,
            name: name.to_string(),
        }
    }
}

impl<W: Write> Sink for FileSink<W> {
    fn name(&self) -> &str {
        &self.name
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');
        self.writer.write_all(buf.as_bytes())?;
        self.writer.flush()
    }
}

/// Write a console status line such as the capture interface name
///
/// Status lines are not part of the record stream; failure is logged and otherwise ignored.
pub fn write_status<W: Write>(writer: &mut W, line: &str) {
    if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
        log::warn!("Failed to write status '{}': {}", line, e);
    }
}

/// Writes each output to every sink independently
///
/// A sink that fails is logged and dropped; the others keep receiving output.
#[derive(Default)]
pub struct DisplayWriter {
    sinks: Vec<Box<dyn Sink>>,
}

impl fmt::Debug for DisplayWriter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list()
            .entries(self.sinks.iter().map(|s| s.name()))
            .finish()
    }
}

impl DisplayWriter {
    /// Writer with no sinks
    pub fn new() -> Self {
        Default::default()
    }

    /// Add a sink
    pub fn add_sink<S: Sink + 'static>(&mut self, sink: S) {
        self.sinks.push(Box::new(sink));
    }

    /// Builder form of [`DisplayWriter::add_sink`]
    pub fn with_sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.add_sink(sink);
        self
    }

    /// Number of sinks still accepting output
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// No sinks remain
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Write `output` to all sinks
    ///
    /// Errors only once every sink has failed.
    pub fn write(&mut self, output: &Output) -> Result<()> {
        if self.sinks.is_empty() {
            return Err(Error::new(ErrorKind::Io, "No output sinks remain"));
        }

        self.sinks.retain_mut(|sink| match sink.write_output(output) {
            Ok(_) => true,
            Err(e) => {
                log::error!("Output to {} failed, no longer writing to it: {}", sink.name(), e);
                false
            }
        });

        if self.sinks.is_empty() {
            Err(Error::new(ErrorKind::Io, "All output sinks failed"))
        } else {
            Ok(())
        }
    }
}
