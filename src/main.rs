use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, Command};

use rmon::commands;

/// Flags shared by every command that runs the collection loop
fn setting_args() -> Vec<Arg> {
    vec![
        Arg::new("interval")
            .short('i')
            .long("interval")
            .value_name("SECONDS")
            .help("Refresh interval in seconds (0.5 - 5.0)"),
        Arg::new("window")
            .short('w')
            .long("window")
            .value_name("SAMPLES")
            .help("Number of samples kept per series (10 - 300)"),
        Arg::new("cpu-alert")
            .long("cpu-alert")
            .value_name("PERCENT")
            .help("CPU usage alert threshold (50 - 100)"),
        Arg::new("memory-alert")
            .long("memory-alert")
            .value_name("PERCENT")
            .help("Memory usage alert threshold (50 - 100)"),
        Arg::new("top")
            .short('t')
            .long("top")
            .value_name("N")
            .help("Number of top processes to show"),
        Arg::new("timeout")
            .long("timeout")
            .value_name("SECONDS")
            .help("Give up on a single sample after this long"),
        Arg::new("budget")
            .long("budget")
            .value_name("N")
            .help("Consecutive failed samples tolerated before stopping"),
        Arg::new("disk")
            .long("disk")
            .value_name("MOUNT")
            .help("Mount point reported as disk usage"),
    ]
}

fn main() -> Result<()> {
    rmon::init_logging();

    let matches = Command::new("rmon")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resource monitor with rolling history and threshold alerts")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("monitor")
                .about("Sample the host continuously and print the current state")
                .args(setting_args())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON object per tick instead of text")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("ticks")
                        .short('n')
                        .long("ticks")
                        .value_name("N")
                        .help("Stop after N published samples")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    Arg::new("export")
                        .short('e')
                        .long("export")
                        .value_name("FILE")
                        .help("Write the retained samples as CSV when monitoring stops"),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Collect a number of samples and write them as CSV")
                .args(setting_args())
                .arg(
                    Arg::new("samples")
                        .short('s')
                        .long("samples")
                        .value_name("N")
                        .help("Number of samples to collect (default: 10)")
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Output file (default: metrics_data_<timestamp>.csv)"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage stored settings (use 'rmon config --help' for subcommands)")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Show current settings"))
                .subcommand(
                    Command::new("set")
                        .about("Set a setting")
                        .arg(
                            Arg::new("key")
                                .help("Setting name")
                                .required(true)
                                .index(1),
                        )
                        .arg(
                            Arg::new("value")
                                .help("New value")
                                .required(true)
                                .index(2),
                        ),
                )
                .subcommand(Command::new("reset").about("Restore default settings"))
                .subcommand(Command::new("path").about("Print the config file location")),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("monitor", sub_matches)) => commands::monitor(sub_matches)?,
        Some(("export", sub_matches)) => commands::export(sub_matches)?,
        Some(("config", sub_matches)) => commands::config::execute(sub_matches)?,
        _ => {
            println!("Use 'rmon --help' for more information.");
        }
    }

    Ok(())
}
