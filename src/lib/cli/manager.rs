use std::sync::Arc;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(version, author, about)]
struct Args {
    /// Turn on verbose (debug) logging
    #[arg(long, short)]
    verbose: bool,

    /// Path of the settings file; a relative path is resolved inside the user
    /// configuration directory
    #[arg(long, value_name = "FILE")]
    settings_file: Option<String>,

    /// Discard the stored settings and restart from the default configuration
    #[arg(long)]
    reset: bool,

    /// Address for the REST API server, overrides the stored settings
    #[arg(long, value_name = "IP:PORT")]
    rest_server: Option<String>,

    /// Directory where the rolling log files are written
    #[arg(long, value_name = "DIR", default_value = "./logs")]
    log_path: String,

    /// Serial port of the display device, overrides the stored settings
    #[arg(long, value_name = "PORT")]
    serial_port: Option<String>,

    /// Baud rate of the display serial link, overrides the stored settings
    #[arg(long, value_name = "BAUD")]
    serial_baud: Option<u32>,
}

#[derive(Debug)]
struct Manager {
    args: Args,
}

lazy_static! {
    static ref MANAGER: Arc<Manager> = Arc::new(Manager { args: Args::parse() });
}

// Construct our manager, should be done inside main
pub fn init() {
    MANAGER.as_ref();
}

pub fn is_verbose() -> bool {
    MANAGER.args.verbose
}

pub fn is_reset() -> bool {
    MANAGER.args.reset
}

pub fn settings_file() -> Option<String> {
    MANAGER.args.settings_file.clone()
}

pub fn server_address() -> Option<String> {
    MANAGER.args.rest_server.clone()
}

pub fn log_path() -> String {
    MANAGER.args.log_path.clone()
}

pub fn serial_port() -> Option<String> {
    MANAGER.args.serial_port.clone()
}

pub fn serial_baud() -> Option<u32> {
    MANAGER.args.serial_baud
}

// Return the command line used to start this application
pub fn command_line_string() -> String {
    std::env::args().collect::<Vec<String>>().join(" ")
}
