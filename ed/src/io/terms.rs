//! Term files: a record count on the first line, then one record per line.
//!
//! Hopping records are `i j re im`, Coulomb records `i j k l re im`, with
//! 1-based orbital indices.

use crate::config::{CoulombEntry, HoppingEntry};
use color_eyre::eyre::{bail, eyre, Result, WrapErr};
use std::fs;
use std::path::Path;

pub fn read_hopping_file(path: &Path) -> Result<Vec<HoppingEntry>> {
    let records = read_records(path, 2)?;
    Ok(records
        .into_iter()
        .map(|(idx, re, im)| (idx[0], idx[1], re, im))
        .collect())
}

pub fn read_coulomb_file(path: &Path) -> Result<Vec<CoulombEntry>> {
    let records = read_records(path, 4)?;
    Ok(records
        .into_iter()
        .map(|(idx, re, im)| (idx[0], idx[1], idx[2], idx[3], re, im))
        .collect())
}

fn read_records(path: &Path, n_indices: usize) -> Result<Vec<(Vec<usize>, f64, f64)>> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Unable to read term file: {}", path.display()))?;
    parse_records(&content, n_indices)
        .wrap_err_with(|| format!("Malformed term file: {}", path.display()))
}

fn parse_records(content: &str, n_indices: usize) -> Result<Vec<(Vec<usize>, f64, f64)>> {
    let mut lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());
    let (_, header) = lines.next().ok_or_else(|| eyre!("Empty term file"))?;
    let count: usize = header
        .split_whitespace()
        .next()
        .ok_or_else(|| eyre!("Missing record count"))?
        .parse()
        .wrap_err("Invalid record count")?;

    let mut records = Vec::with_capacity(count);
    for (number, line) in lines.take(count) {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < n_indices + 2 {
            bail!(
                "Line {}: expected {} fields, found {}",
                number + 1,
                n_indices + 2,
                fields.len()
            );
        }
        let indices = fields[..n_indices]
            .iter()
            .map(|f| f.parse::<usize>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .wrap_err_with(|| format!("Line {}: invalid orbital index", number + 1))?;
        let re: f64 = fields[n_indices]
            .parse()
            .wrap_err_with(|| format!("Line {}: invalid real part", number + 1))?;
        let im: f64 = fields[n_indices + 1]
            .parse()
            .wrap_err_with(|| format!("Line {}: invalid imaginary part", number + 1))?;
        records.push((indices, re, im));
    }
    if records.len() != count {
        bail!("Expected {} records, found {}", count, records.len());
    }
    Ok(records)
}
