use anyhow::Result;

use mdash::cli::build_cli;
use mdash::commands;

fn main() -> Result<()> {
    mdash::init_logging();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("watch", sub_matches)) => commands::watch(sub_matches)?,
        Some(("snapshot", sub_matches)) => commands::snapshot(sub_matches)?,
        Some(("config", sub_matches)) => commands::config::handle_config(sub_matches)?,
        Some(("completions", sub_matches)) => {
            let mut cli = build_cli();
            commands::completions::execute(sub_matches, &mut cli)?;
        }
        Some(("version", _)) => commands::version()?,
        _ => {
            println!("Use 'mdash --help' for more information.");
        }
    }

    Ok(())
}
