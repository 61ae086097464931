//! Synthetic usbmon packets and a runner for the *usbsniff* binary, runner adapted from 'fd' method: https://github.com/sharkdp/fd/blob/master/tests/testenv/mod.rs
#![allow(dead_code)]
use std::env;
use std::path::PathBuf;
use std::process;

use usbsniff::decoder::Decoder;
use usbsniff::display::{FileSink, Sink};
use usbsniff::urb::{CaptureEvent, USBMON_MMAPPED_HEADER_LEN};

/// Bus of the device in generated packets
pub const BUS: u16 = 3;
/// Address of the device in generated packets
pub const ADDRESS: u8 = 12;

/// Builder for a raw mmapped usbmon packet as libpcap delivers it
#[derive(Debug, Clone)]
pub struct UsbmonPacket {
    id: u64,
    event_type: u8,
    transfer_type: u8,
    endpoint: u8,
    address: u8,
    bus: u16,
    setup: Option<[u8; 8]>,
    data: Vec<u8>,
    data_len: Option<u32>,
    ts: (i64, i32),
}

impl UsbmonPacket {
    pub fn new(id: u64, event_type: u8, transfer_type: u8, endpoint: u8) -> Self {
        UsbmonPacket {
            id,
            event_type,
            transfer_type,
            endpoint,
            address: ADDRESS,
            bus: BUS,
            setup: None,
            data: Vec::new(),
            data_len: None,
            ts: (1_700_000_000, 0),
        }
    }

    pub fn address(mut self, bus: u16, address: u8) -> Self {
        self.bus = bus;
        self.address = address;
        self
    }

    pub fn setup(mut self, setup: [u8; 8]) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn data(mut self, data: &[u8]) -> Self {
        self.data = data.to_vec();
        self
    }

    /// Header reports `len` bytes regardless of those attached
    pub fn data_len(mut self, len: u32) -> Self {
        self.data_len = Some(len);
        self
    }

    pub fn at(mut self, sec: i64, usec: i32) -> Self {
        self.ts = (sec, usec);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut raw = vec![0u8; USBMON_MMAPPED_HEADER_LEN];
        raw[0..8].copy_from_slice(&self.id.to_ne_bytes());
        raw[8] = self.event_type;
        raw[9] = self.transfer_type;
        raw[10] = self.endpoint;
        raw[11] = self.address;
        raw[12..14].copy_from_slice(&self.bus.to_ne_bytes());
        raw[14] = if self.setup.is_some() { 0 } else { b'-' };
        raw[16..24].copy_from_slice(&self.ts.0.to_ne_bytes());
        raw[24..28].copy_from_slice(&self.ts.1.to_ne_bytes());
        let data_len = self.data_len.unwrap_or(self.data.len() as u32);
        raw[32..36].copy_from_slice(&data_len.to_ne_bytes());
        raw[36..40].copy_from_slice(&data_len.to_ne_bytes());
        if let Some(setup) = self.setup {
            raw[40..48].copy_from_slice(&setup);
        }
        raw.extend_from_slice(&self.data);
        raw
    }
}

/// Run raw packets through `decoder` into a [`FileSink`] the way the binary does and return the text
pub fn decode_to_string(decoder: &mut Decoder, packets: &[Vec<u8>]) -> String {
    let mut buf: Vec<u8> = Vec::new();
    {
        let mut sink = FileSink::new(&mut buf, "memory");
        for raw in packets {
            let event = CaptureEvent::from_usbmon(raw, USBMON_MMAPPED_HEADER_LEN)
                .expect("valid usbmon packet");
            if let Some(output) = decoder.process(&event) {
                sink.write_output(&output).expect("write to memory");
            }
        }
    }
    String::from_utf8(buf).expect("utf-8 output")
}

/// Format an error message for when the output did not match the expected output.
pub fn format_output_error(expected: &str, actual: &str) -> String {
    // Generate diff text.
    let diff_text = diff::lines(expected, actual)
        .into_iter()
        .map(|diff| match diff {
            diff::Result::Left(l) => format!("-{}", l),
            diff::Result::Both(l, _) => format!(" {}", l),
            diff::Result::Right(r) => format!("+{}", r),
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Decoded output did not match.\nShowing diff between expected and actual:\n{}\n",
        diff_text
    )
}

pub fn assert_output(expected: &str, actual: &str) {
    if expected != actual {
        panic!("{}", format_output_error(expected, actual));
    }
}

/// Environment for the integration tests.
pub struct TestEnv {
    /// Path to the *usbsniff* executable.
    usbsniff_exe: PathBuf,
}

/// Find the *usbsniff* executable.
fn find_usbsniff_exe() -> PathBuf {
    // Tests exe is in target/debug/deps, the *usbsniff* exe is in target/debug
    let root = env::current_exe()
        .expect("tests executable")
        .parent()
        .expect("tests executable directory")
        .parent()
        .expect("usbsniff executable directory")
        .to_path_buf();

    let exe_name = if cfg!(windows) {
        "usbsniff.exe"
    } else {
        "usbsniff"
    };

    root.join(exe_name)
}

/// Trim whitespace from the beginning of each line.
fn trim_lines(s: &str) -> String {
    s.lines()
        .map(|line| line.trim_start())
        .fold(String::new(), |mut str, line| {
            str.push_str(line);
            str.push('\n');
            str
        })
}

impl TestEnv {
    pub fn new() -> TestEnv {
        TestEnv {
            usbsniff_exe: find_usbsniff_exe(),
        }
    }

    /// Get the path of the usbsniff executable.
    #[cfg_attr(windows, allow(unused))]
    pub fn test_exe(&self) -> &PathBuf {
        &self.usbsniff_exe
    }

    /// Assert that calling *usbsniff* with the specified arguments fails and stderr contains `expected`.
    pub fn assert_failure_with_error(&self, args: &[&str], expected: &str) -> process::Output {
        let output = process::Command::new(&self.usbsniff_exe)
            .args(args)
            .output()
            .expect("usbsniff output");

        if output.status.success() {
            panic!("`usbsniff {}` did not fail as expected.", args.join(" "));
        }

        let actual_err = trim_lines(&String::from_utf8_lossy(&output.stderr));
        if !actual_err.contains(expected) {
            panic!(
                "`usbsniff {}` stderr did not contain '{}':\n---\n{}---",
                args.join(" "),
                expected,
                actual_err
            );
        }

        output
    }
}
