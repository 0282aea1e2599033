//! Switch a PS 2000 B on or off, or print what it reports about itself.
//!
//! ```text
//! cargo run --example serial -- <on|off|toggle|info> [port]
//! ```
//!
//! Set `RUST_LOG=trace` to see every telegram.

use std::env;

use ea_ps2000::{
    link::{LinkSettings, Parity},
    object::PsObject,
    psu::{DEFAULT_DEVICE_TYPE, ObjectValue, Ps2000},
    types::ControlMode,
};
use inquire::Select;
use serialport::SerialPort;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            // The end of every reply.
            std::io::ErrorKind::TimedOut => embedded_io::ErrorKind::TimedOut,
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

enum Action {
    On,
    Off,
    Toggle,
    Info,
}

fn open_port(port_name: &str, settings: &LinkSettings) -> PortWrapper {
    let parity = match settings.parity {
        Parity::None => serialport::Parity::None,
        Parity::Odd => serialport::Parity::Odd,
        Parity::Even => serialport::Parity::Even,
    };

    let port = serialport::new(port_name, settings.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .stop_bits(serialport::StopBits::One)
        .parity(parity)
        .timeout(std::time::Duration::from_millis(settings.read_timeout_ms() as u64))
        .open()
        .expect("Failed to open serial port");

    PortWrapper(port)
}

fn print_info(psu: &mut Ps2000<PortWrapper>) {
    for object in [
        PsObject::DeviceType,
        PsObject::SerialNumber,
        PsObject::ArticleNumber,
        PsObject::Manufacturer,
        PsObject::SoftwareVersion,
        PsObject::NominalVoltage,
        PsObject::NominalCurrent,
        PsObject::NominalPower,
        PsObject::DeviceClass,
    ] {
        match psu.get_object(object) {
            Ok(ObjectValue::String(s)) => println!("{:<16} {}", format!("{object:?}"), s),
            Ok(ObjectValue::Float(f)) => println!("{:<16} {f}", format!("{object:?}")),
            Ok(ObjectValue::Integer(i)) => println!("{:<16} 0x{i:04x}", format!("{object:?}")),
            Ok(ObjectValue::Binary(b)) => println!("{:<16} {:02x?}", format!("{object:?}"), b.as_bytes()),
            Err(e) => println!("{object:?}: {e}"),
        }
    }

    println!("OVP              {:.2} V", psu.get_ovp_threshold().unwrap());
    println!("OCP              {:.3} A", psu.get_ocp_threshold().unwrap());

    let actual = psu.read_actual().unwrap();
    println!("{}", if actual.remote { "remote" } else { "local" });
    println!("output {}", if actual.output_on { "on" } else { "off" });
    match actual.control_mode {
        ControlMode::Cc => println!("constant current"),
        ControlMode::Cv => println!("constant voltage"),
    }
    for (name, active) in [
        ("over-voltage", actual.ovp),
        ("over-current", actual.ocp),
        ("over-power", actual.opp),
        ("over-temperature", actual.otp),
    ] {
        println!(
            "{name} protection {}",
            if active { "active" } else { "inactive" }
        );
    }
    println!("actual voltage {:.3} V", actual.voltage);
    println!("actual current {:.3} A", actual.current);
}

fn main() {
    env_logger::init();

    let action = match env::args().nth(1).as_deref() {
        Some("on") => Action::On,
        Some("off") => Action::Off,
        Some("toggle") => Action::Toggle,
        Some("info") => Action::Info,
        _ => {
            eprintln!("usage: serial <on|off|toggle|info> [port]");
            std::process::exit(2);
        }
    };

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(2).unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    let settings = LinkSettings::default();
    let port = open_port(&port_name, &settings);
    let mut psu = Ps2000::open(port).expect("Failed to read nominal values");

    if !psu.check_available(DEFAULT_DEVICE_TYPE).unwrap() {
        eprintln!("Warning: device is not a {DEFAULT_DEVICE_TYPE}");
    }

    let mut session = psu.remote_session().expect("Failed to enter remote control");

    match action {
        Action::On => {
            println!("turning on");
            session.set_output_on(true).unwrap();
        }
        Action::Off => {
            println!("turning off");
            session.set_output_on(false).unwrap();
        }
        Action::Toggle => {
            let output_on = session.get_output_on().unwrap();
            if output_on {
                println!("Output on -> turning off");
            } else {
                println!("Output off -> turning on");
            }
            session.set_output_on(!output_on).unwrap();
        }
        Action::Info => print_info(&mut session),
    }

    session.finish().expect("Failed to restore local control");
}
