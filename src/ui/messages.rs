// Console status lines for the non-interactive commands

use colored::Colorize;
use std::io::{self, Write};

pub fn success(message: &str) {
    println!("{}", message.green().bold());
}

/// Warnings go to stderr so `--json` output stays parseable.
pub fn warn(message: &str) {
    eprintln!("{}", message.yellow());
}

pub fn dimmed(message: &str) {
    println!("{}", message.dimmed());
}

/// Ask a yes/no question on stdin; anything but y/yes is a no.
pub fn confirm(message: &str) -> io::Result<bool> {
    print!("{} [y/N] ", message.white().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}
