//! Mocha CLI entry point
//!
//! Parses the command line, runs the command and reports failures with
//! context and suggestions:
//! - `render` - Render a template to HTML
//! - `exec` - Run the server scripts of a document and print the result

use mocha_template::cli;
use mocha_template::core::user_friendly_error;
use clap::Parser;

fn main() {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(e) = cli.execute() {
        user_friendly_error(e).display();
        std::process::exit(1);
    }
}
