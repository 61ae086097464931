//! Where the magic happens for `usbsniff` binary!
use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use usbsniff::config::Config;
use usbsniff::device::VidPid;
use usbsniff::error::{Error, ErrorKind, Result};

/// Print each USB transfer of one device as a line, from a live usbmon capture
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, max_term_width = 80)]
struct Args {
    /// Vendor and product ID of the device to capture, in hexadecimal
    #[arg(value_name = "VID:PID", required_unless_present = "list_interfaces")]
    device: Option<VidPid>,

    /// Also write output to this file; it is created or truncated
    #[arg(value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,

    /// Path to user config file to use for custom settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disable coloured output, can also use NO_COLOR environment variable
    #[arg(long, default_value_t = false)]
    no_colour: bool,

    /// Load the usbmon kernel module before opening the capture
    #[arg(long, default_value_t = false)]
    modprobe: bool,

    /// Capture on the interface for all buses rather than just the device bus
    #[arg(long, default_value_t = false)]
    all_buses: bool,

    /// List interfaces available for capture and exit
    #[arg(long, default_value_t = false)]
    list_interfaces: bool,

    /// Turn debugging information on. Alternatively can use RUST_LOG env: INFO, DEBUG, TRACE
    #[arg(short = 'z', long, action = clap::ArgAction::Count)]
    debug: u8,
}

/// Process exit status for an error
fn exit_code(e: &Error) -> i32 {
    match e.kind() {
        ErrorKind::Capture => 2,
        _ => 1,
    }
}

fn merge_config(args: &Args) -> Result<Config> {
    let mut config = Config::load(args.config.as_deref())?;
    config.no_colour |= args.no_colour;
    config.modprobe |= args.modprobe;
    Ok(config)
}

#[cfg(target_os = "linux")]
fn sniff(args: Args, config: Config) -> Result<()> {
    use usbsniff::capture::{self, CaptureSession};
    use usbsniff::decoder::{Decoder, Target};
    use usbsniff::device;
    use usbsniff::display::{write_status, ConsoleSink, DisplayWriter, FileSink};

    let mut stdout = std::io::stdout();

    if args.list_interfaces {
        for interface in capture::list_interfaces()? {
            write_status(&mut stdout, &interface);
        }
        return Ok(());
    }

    let vidpid = args
        .device
        .ok_or_else(|| Error::new(ErrorKind::InvalidArg, "No <VID:PID> supplied"))?;

    let mut writer = DisplayWriter::new().with_sink(ConsoleSink::stdout(!config.no_colour));
    if let Some(path) = args.log_file.as_ref() {
        writer.add_sink(FileSink::create(path)?);
    }

    let location = device::find_device(&vidpid)?;
    log::info!(
        "bus_number={}, device_number={}",
        location.bus,
        location.address
    );

    if config.modprobe {
        if let Err(e) = capture::load_usbmon() {
            log::warn!("{:#}", e);
        }
    }

    let bus = if args.all_buses { 0 } else { location.bus };
    let interface = capture::interface_name(&config.interface_prefix, bus);
    write_status(&mut stdout, &format!("pcap device: {}", interface));

    let mut session = CaptureSession::open(&interface, &config).inspect_err(|_| {
        eprintln!("Please check the usbmon module is loaded (--modprobe) and capture permissions.");
    })?;

    let mut decoder = Decoder::new(Target::new(location.bus as u16, location.address))
        .with_max_payload_size(config.max_payload_size);

    session.run(|event| {
        if let Some(output) = decoder.process(event) {
            writer.write(&output)?;
        }
        Ok(())
    })?;

    log::info!("{:?}", decoder.stats());
    write_status(&mut stdout, "exit");

    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn sniff(_args: Args, _config: Config) -> Result<()> {
    Err(Error::new(
        ErrorKind::Unsupported,
        "Live capture requires the Linux usbmon interface",
    ))
}

fn main() {
    let args = match Args::try_parse() {
        Ok(a) => a,
        Err(e) => {
            let _ = e.print();
            if e.kind() == clap::error::ErrorKind::ValueValidation {
                eprintln!("\n{}", Args::command().render_usage());
            }
            std::process::exit(e.exit_code());
        }
    };

    if let Err(e) = usbsniff::set_log_level(args.debug) {
        eprintln!("{}", e);
    }

    let result = merge_config(&args).and_then(|config| sniff(args, config));
    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(exit_code(&e));
    }
}
