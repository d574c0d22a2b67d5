//! CSV register tables: gamma LUT loads and register dump files.
//!
//! Files carry one header row, `#` starts a comment, columns are comma
//! separated hex words.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{BoardError, Result};
use crate::register::{RegisterAddress, RegisterData};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GammaEntry {
    pub address: RegisterAddress,
    pub data: RegisterData,
}

fn read_table(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(BoardError::MissingResource(path.to_path_buf()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Data rows as (1-based line number, trimmed columns).
fn rows(text: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    text.lines()
        .enumerate()
        .skip(1)
        .filter_map(|(i, line)| {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() {
                return None;
            }
            Some((i + 1, line.split(',').map(str::trim).collect()))
        })
}

pub fn parse_gamma_table(text: &str, label: &str) -> Result<Vec<GammaEntry>> {
    let err = |line: usize, reason: String| BoardError::GammaTable {
        path: label.to_string(),
        line,
        reason,
    };
    rows(text)
        .map(|(line, cols)| {
            if cols.len() < 2 {
                return Err(err(line, "expected address,data".into()));
            }
            let address = RegisterAddress::from_hex(cols[0]).map_err(|e| err(line, e.to_string()))?;
            let data = RegisterData::from_hex(cols[1]).map_err(|e| err(line, e.to_string()))?;
            Ok(GammaEntry { address, data })
        })
        .collect()
}

pub fn load_gamma_table(path: &Path) -> Result<Vec<GammaEntry>> {
    let text = read_table(path)?;
    parse_gamma_table(&text, &path.display().to_string())
}

/// Addresses to read, each with the text it was written as.
pub fn parse_address_list(text: &str, label: &str) -> Result<Vec<(String, RegisterAddress)>> {
    rows(text)
        .map(|(line, cols)| {
            let addr = cols[0];
            RegisterAddress::from_hex(addr)
                .map(|a| (addr.to_string(), a))
                .map_err(|e| BoardError::GammaTable {
                    path: label.to_string(),
                    line,
                    reason: e.to_string(),
                })
        })
        .collect()
}

pub fn load_address_list(path: &Path) -> Result<Vec<(String, RegisterAddress)>> {
    let text = read_table(path)?;
    parse_address_list(&text, &path.display().to_string())
}

/// Write `# Address, Value` then one `address,0x<payload hex>` line per read.
pub fn write_register_dump<W: Write>(out: W, rows: &[(String, Vec<u8>)]) -> Result<()> {
    let mut w = BufWriter::new(out);
    writeln!(w, "# Address, Value")?;
    for (addr, value) in rows {
        writeln!(w, "{},0x{}", addr, hex::encode(value))?;
    }
    w.flush()?;
    Ok(())
}
