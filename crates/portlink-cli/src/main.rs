//! Command-line front end for the serial link worker.
//!
//! Two subcommands: `ports` lists the serial devices the OS currently
//! exposes, and `monitor` attaches a reconnecting link to one of them and
//! prints every event as it arrives. Logging is controlled by `RUST_LOG`.

use clap::{Parser, Subcommand};
use portlink_worker::{Event, FramingMode, LinkConfig, LinkHandle};
use std::io::{self, BufRead};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "portlink", version, about = "Reconnecting serial link monitor")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List serial ports available on this machine.
    Ports,

    /// Attach to a port and print events; lines typed on stdin are sent.
    /// Closing stdin (Ctrl-D) drains pending messages and exits.
    Monitor {
        /// Serial port name, e.g. /dev/ttyUSB0 or COM3.
        #[arg(short, long)]
        port: String,

        /// Baud rate.
        #[arg(short, long, default_value_t = 115_200)]
        baud: u32,

        /// Frame on this byte value instead of newline-terminated text.
        #[arg(long)]
        separator: Option<u8>,

        /// Reconnect delay in milliseconds.
        #[arg(long, default_value_t = 1000)]
        reconnect_ms: u64,
    },
}

fn main() -> portlink_worker::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Ports => list_ports(),
        Command::Monitor {
            port,
            baud,
            separator,
            reconnect_ms,
        } => monitor(port, baud, separator, reconnect_ms),
    }
}

fn list_ports() -> portlink_worker::Result<()> {
    let ports = serialport::available_ports().unwrap_or_default();
    if ports.is_empty() {
        println!("no serial ports found");
        return Ok(());
    }
    for port in ports {
        println!("{}", port.port_name);
    }
    Ok(())
}

fn monitor(
    port: String,
    baud: u32,
    separator: Option<u8>,
    reconnect_ms: u64,
) -> portlink_worker::Result<()> {
    let config = LinkConfig::new(port.as_str(), baud)
        .with_reconnect_delay(Duration::from_millis(reconnect_ms));
    let mode = match separator {
        Some(separator) => FramingMode::Delimited { separator },
        None => FramingMode::Lines,
    };

    let link = LinkHandle::spawn(config, mode)?;
    info!(%port, baud, "monitoring, close stdin to stop");

    // Stdin lines become outbound payloads; EOF requests shutdown.
    let running = Arc::new(AtomicBool::new(true));
    let running_stdin = running.clone();
    let sender = link.sender();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines().map_while(io::Result::ok) {
            sender.send(line);
        }
        running_stdin.store(false, Ordering::SeqCst);
    });

    while running.load(Ordering::SeqCst) {
        match link.poll() {
            Some(Event::Connected) => println!("<< connected"),
            Some(Event::Disconnected) => println!("<< disconnected, retrying"),
            Some(Event::Data(payload)) => println!("<< {payload}"),
            None => std::thread::sleep(Duration::from_millis(10)),
        }
    }

    info!("stopping link");
    link.shutdown();
    Ok(())
}
