// Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};

/// Options shared by every command that runs a dashboard.
fn dashboard_args() -> Vec<Arg> {
    vec![
        Arg::new("agent-id")
            .long("agent-id")
            .value_name("ID")
            .help("Coordinating agent whose deployment config lists the devices"),
        Arg::new("app-key")
            .long("app-key")
            .value_name("KEY")
            .help("Dashboard application key holding the DEVICE_MAP"),
        Arg::new("manager-app-key")
            .long("manager-app-key")
            .value_name("KEY")
            .help("Maintenance manager key: tag namespace and reset command prefix"),
        Arg::new("feed-file")
            .long("feed-file")
            .value_name("PATH")
            .help("Replay channel data from a JSON-lines file")
            .conflicts_with("ws"),
        Arg::new("pace-ms")
            .long("pace-ms")
            .value_name("MS")
            .help("Delay between replayed lines")
            .value_parser(value_parser!(u64))
            .requires("feed-file"),
        Arg::new("ws")
            .long("ws")
            .value_name("URL")
            .help("Connect to a live channel server (ws:// or wss://)"),
        Arg::new("refresh-secs")
            .long("refresh-secs")
            .value_name("SECS")
            .help("How often relative timestamps are refreshed")
            .value_parser(value_parser!(u64)),
        Arg::new("config")
            .long("config")
            .value_name("PATH")
            .help("Use this config file instead of the default location"),
    ]
}

pub fn build_cli() -> Command {
    Command::new("mdash")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live maintenance dashboard for a fleet of devices")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("watch")
                .about("Open the interactive dashboard")
                .args(dashboard_args()),
        )
        .subcommand(
            Command::new("snapshot")
                .about("Print the fleet table once every device has reported")
                .args(dashboard_args())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the snapshot as JSON")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("timeout-ms")
                        .long("timeout-ms")
                        .value_name("MS")
                        .help("Give up waiting for devices after this long")
                        .value_parser(value_parser!(u64))
                        .default_value("5000"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Inspect or create the config file")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_name("PATH")
                        .global(true)
                        .help("Use this config file instead of the default location"),
                )
                .subcommand(Command::new("show").about("Print the effective config"))
                .subcommand(Command::new("path").about("Print the config file location"))
                .subcommand(
                    Command::new("init")
                        .about("Write a config file")
                        .arg(
                            Arg::new("agent-id")
                                .long("agent-id")
                                .value_name("ID")
                                .help("Coordinating agent to store in the config"),
                        )
                        .arg(
                            Arg::new("force")
                                .short('f')
                                .long("force")
                                .help("Overwrite an existing file without asking")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .help("Shell to generate for (bash, zsh, fish, powershell, elvish)")
                        .required(true)
                        .index(1),
                ),
        )
        .subcommand(Command::new("version").about("Shows version information"))
}
