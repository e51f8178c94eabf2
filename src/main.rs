use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use vitalwatch::commands;

fn build_cli() -> Command {
    Command::new("vitalwatch")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Collect, score and report runtime performance vitals")
        .disable_version_flag(true)
        .arg(
            Arg::new("version")
                .short('v')
                .short_alias('V')
                .long("version")
                .help("Print version information")
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("run")
                .about("Collect vitals from this machine until stopped")
                .arg(
                    Arg::new("endpoint")
                        .short('e')
                        .long("endpoint")
                        .value_name("URL")
                        .help("Analytics endpoint to report to (overrides config)"),
                )
                .arg(
                    Arg::new("duration")
                        .short('d')
                        .long("duration")
                        .value_name("SECONDS")
                        .help("Stop after this many seconds (default: until Ctrl+C)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval")
                        .value_name("SECONDS")
                        .help("Seconds between printed reports")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON line per report")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("score")
                .about("Score a saved metrics snapshot")
                .arg(
                    Arg::new("snapshot")
                        .help("Path to a snapshot JSON file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("low-end")
                        .long("low-end")
                        .help("Score as if on a low-end device")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the score as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Manage collector configuration")
                .subcommand_required(true)
                .arg_required_else_help(true)
                .subcommand(Command::new("show").about("Print the effective configuration"))
                .subcommand(Command::new("path").about("Print the config file location"))
                .subcommand(
                    Command::new("init")
                        .about("Write a default config file")
                        .arg(
                            Arg::new("force")
                                .short('f')
                                .long("force")
                                .help("Overwrite an existing file")
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

fn main() -> Result<()> {
    vitalwatch::init_logging();

    let matches = build_cli().get_matches();

    if matches.get_flag("version") {
        return commands::version();
    }

    match matches.subcommand() {
        Some(("run", sub_matches)) => commands::run(sub_matches),
        Some(("score", sub_matches)) => commands::score(sub_matches),
        Some(("config", sub_matches)) => commands::config::execute(sub_matches),
        Some(("completions", sub_matches)) => {
            commands::completions::execute(sub_matches, &mut build_cli())
        }
        Some(("version", _)) => commands::version(),
        _ => {
            println!("Welcome to vitalwatch!");
            println!("Use 'vitalwatch --help' for more information.");
            Ok(())
        }
    }
}
