//! Subcommand implementations

pub mod inspect;
pub mod pack;
pub mod verify;

use anyhow::{Context, Result};
use medialist_core::{media, TypeCatalog};
use std::fs;
use std::io::{self, Read};

/// Read a file, or stdin when `input` is `-`
pub fn read_input(input: &str) -> Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input))
    }
}

/// The media catalog, minus any excluded format modules
pub fn catalog_without(exclude: &[String]) -> TypeCatalog {
    let catalog = media::build_catalog();
    if exclude.is_empty() {
        catalog
    } else {
        catalog.without_modules(exclude)
    }
}
