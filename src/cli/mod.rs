pub mod actions;
pub mod config;
pub mod console;
pub mod view;

use clap::{Arg, ArgMatches, Command};

pub fn build_command() -> Command {
    Command::new("marauder")
        .about("Headless serial console for ESP32 Marauder firmware")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("list-ports")
                .long("list-ports")
                .short('l')
                .help("List all available serial ports and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .short('j')
                .help("Print ports and session events as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .short('p')
                .help("Serial port the Marauder board is attached to (e.g. COM3, /dev/ttyUSB0)")
                .value_name("PORT"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("Console configuration file (JSON)")
                .value_name("FILE"),
        )
        .arg(
            Arg::new("send")
                .long("send")
                .short('s')
                .help("Send one command, print the device output, then exit")
                .value_name("COMMAND")
                .conflicts_with("list-ports"),
        )
        .arg(
            Arg::new("listen-ms")
                .long("listen-ms")
                .help("How long --send keeps printing device output")
                .value_name("MS")
                .value_parser(clap::value_parser!(u64))
                .requires("send"),
        )
}

/// Parse command line arguments and return ArgMatches.
pub fn parse_args() -> ArgMatches {
    build_command().get_matches()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_ms_requires_send() {
        let res = build_command().try_get_matches_from(["marauder", "--listen-ms", "100"]);
        assert!(res.is_err());
    }

    #[test]
    fn send_conflicts_with_list_ports() {
        let res = build_command().try_get_matches_from(["marauder", "-l", "--send", "info"]);
        assert!(res.is_err());
    }

    #[test]
    fn one_shot_arguments_parse() {
        let matches = build_command()
            .try_get_matches_from([
                "marauder",
                "-p",
                "/dev/ttyUSB0",
                "--send",
                "scan -t wifi",
                "--listen-ms",
                "500",
                "--json",
            ])
            .expect("valid arguments");
        assert_eq!(
            matches.get_one::<String>("port").map(String::as_str),
            Some("/dev/ttyUSB0")
        );
        assert_eq!(
            matches.get_one::<String>("send").map(String::as_str),
            Some("scan -t wifi")
        );
        assert_eq!(matches.get_one::<u64>("listen-ms"), Some(&500));
        assert!(matches.get_flag("json"));
    }

    #[test]
    fn command_definition_is_consistent() {
        build_command().debug_assert();
    }
}
