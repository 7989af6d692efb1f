//! Man page generator for pinforge
//!
//! Writes `pinforge.1` plus one `pinforge-<command>.1` page per
//! subcommand.
//!
//! Usage: cargo run --bin gen-manpage -- [output-dir]

use clap::{Command, CommandFactory};
use std::fs;
use std::io;
use std::path::PathBuf;

#[allow(dead_code)]
#[path = "../cli.rs"]
mod cli;

/// Render every page as (file name, roff source)
fn render_pages(cmd: &Command) -> io::Result<Vec<(String, Vec<u8>)>> {
    let mut pages = Vec::new();

    let mut buffer = Vec::new();
    clap_mangen::Man::new(cmd.clone()).render(&mut buffer)?;
    pages.push(("pinforge.1".to_string(), buffer));

    for sub in cmd.get_subcommands().filter(|sub| !sub.is_hide_set()) {
        let title = format!("pinforge-{}", sub.get_name());
        let sub = sub
            .clone()
            .bin_name(format!("pinforge {}", sub.get_name()));
        let mut buffer = Vec::new();
        clap_mangen::Man::new(sub)
            .title(title.clone())
            .render(&mut buffer)?;
        pages.push((format!("{}.1", title), buffer));
    }
    Ok(pages)
}

fn main() -> io::Result<()> {
    let output_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("man"), PathBuf::from);

    fs::create_dir_all(&output_dir)?;

    for (name, page) in render_pages(&cli::Cli::command())? {
        let path = output_dir.join(name);
        fs::write(&path, page)?;
        println!("Man page generated at: {}", path.display());
    }

    println!("\nTo view the main page:");
    println!("  man -l {}", output_dir.join("pinforge.1").display());
    println!("\nTo install system-wide (requires sudo):");
    println!(
        "  sudo cp {}/*.1 /usr/local/share/man/man1/",
        output_dir.display()
    );
    println!("  sudo mandb");

    Ok(())
}
