//! MATPOWER case text: reading `mpc.gen` / `mpc.gencost` and writing them back
//!
//! Only the tables the clearing engine touches are parsed. Everything else in
//! the file (buses, branches, comments, custom fields) is left alone by
//! [`rewrite_case`], which swaps the two matrices in place.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use smkt_core::{CostModelKind, CostRecord, CostTable, GenRecord, COST};

use crate::helpers::{safe_f64_to_i32, safe_f64_to_usize};

/// Minimum column counts
const GEN_COLUMNS: usize = 10;
const GENCOST_COLUMNS: usize = 4;

/// The market-relevant part of a MATPOWER case
#[derive(Debug, Clone, PartialEq)]
pub struct MarketCase {
    pub version: String,
    pub base_mva: f64,
    pub gen: Vec<GenRecord>,
    pub gencost: CostTable,
}

impl Default for MarketCase {
    fn default() -> Self {
        Self {
            version: String::new(),
            base_mva: 100.0,
            gen: Vec::new(),
            gencost: CostTable::default(),
        }
    }
}

/// Parse a MATPOWER .m file
pub fn parse_case_file(path: &Path) -> Result<MarketCase> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading MATPOWER file: {}", path.display()))?;
    parse_case_string(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Parse MATPOWER content from a string (single pass)
pub fn parse_case_string(content: &str) -> Result<MarketCase> {
    let mut case = MarketCase::default();
    let mut found_gen = false;
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let trimmed = strip_comment(line).trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("mpc.version") && trimmed.contains('=') {
            case.version = extract_inline_string(trimmed);
        } else if trimmed.starts_with("mpc.baseMVA") && trimmed.contains('=') {
            if let Some(v) = extract_inline_scalar(trimmed) {
                case.base_mva = v;
            }
        } else if is_matrix_header(trimmed, "mpc.gencost") {
            let rows = parse_matrix_section("mpc.gencost", trimmed, &mut lines, GENCOST_COLUMNS)?;
            case.gencost = CostTable::new(
                rows.iter()
                    .enumerate()
                    .map(|(i, values)| parse_gencost_row(values, i))
                    .collect::<Result<_>>()?,
            );
        } else if is_matrix_header(trimmed, "mpc.gen") {
            let rows = parse_matrix_section("mpc.gen", trimmed, &mut lines, GEN_COLUMNS)?;
            case.gen = rows
                .iter()
                .enumerate()
                .map(|(i, values)| parse_gen_row(values, i))
                .collect::<Result<_>>()?;
            found_gen = true;
        }
    }

    if !found_gen {
        return Err(anyhow!("mpc.gen matrix not found"));
    }

    Ok(case)
}

/// `mpc.gen = [` but not `mpc.genfuel = {`
fn is_matrix_header(line: &str, name: &str) -> bool {
    line.strip_prefix(name)
        .map(|rest| rest.trim_start().starts_with('='))
        .unwrap_or(false)
        && line.contains('[')
}

fn strip_comment(line: &str) -> &str {
    line.split('%').next().unwrap_or("")
}

/// Extract string value from a single line (e.g., "mpc.version = '2';")
fn extract_inline_string(line: &str) -> String {
    line.split('=')
        .nth(1)
        .map(|v| {
            v.trim()
                .trim_matches(|c| c == '\'' || c == '"' || c == ';')
                .to_string()
        })
        .unwrap_or_default()
}

/// Extract scalar value from a single line (e.g., "mpc.baseMVA = 100.0;")
fn extract_inline_scalar(line: &str) -> Option<f64> {
    line.split('=')
        .nth(1)
        .and_then(|v| v.trim().trim_end_matches(';').trim().parse().ok())
}

/// Parse a row of numeric values
fn parse_row(line: &str) -> Result<Vec<f64>> {
    line.split(|c: char| c.is_whitespace() || c == ';' || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().with_context(|| format!("invalid number '{}'", s)))
        .collect()
}

/// Check if a line signals end of matrix section
fn is_matrix_end(line: &str) -> bool {
    line.trim().ends_with("];")
}

/// Collect the numeric rows of one matrix, starting at its header line.
///
/// A non-empty row with fewer than `min_columns` values is an error: skipping
/// it would shift every later row onto the wrong generator.
fn parse_matrix_section<'a>(
    name: &str,
    header: &str,
    lines: &mut impl Iterator<Item = &'a str>,
    min_columns: usize,
) -> Result<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    let mut push = |text: &str| -> Result<()> {
        let row_idx = rows.len();
        let values = parse_row(text.trim_end_matches("];"))
            .with_context(|| format!("{} row {}", name, row_idx))?;
        if values.is_empty() {
            return Ok(());
        }
        if values.len() < min_columns {
            return Err(anyhow!(
                "{} row {} has {} columns, expected at least {}",
                name,
                row_idx,
                values.len(),
                min_columns
            ));
        }
        rows.push(values);
        Ok(())
    };

    // Data may start on the header line, after '['
    if let Some(after_bracket) = header.split_once('[').map(|(_, rest)| rest) {
        push(after_bracket)?;
        if is_matrix_end(header) {
            return Ok(rows);
        }
    }

    for line in lines {
        let trimmed = strip_comment(line).trim();
        if trimmed.is_empty() {
            continue;
        }
        push(trimmed)?;
        if is_matrix_end(trimmed) {
            break;
        }
    }
    Ok(rows)
}

fn parse_gen_row(values: &[f64], row_idx: usize) -> Result<GenRecord> {
    Ok(GenRecord {
        bus: safe_f64_to_usize(values[0])
            .with_context(|| format!("invalid gen_bus at row {}", row_idx))?,
        pg: values[1],
        qg: values[2],
        qmax: values[3],
        qmin: values[4],
        vg: values[5],
        mbase: values[6],
        status: values[7] > 0.0,
        pmax: values[8],
        pmin: values[9],
        extra: values[GEN_COLUMNS..].to_vec(),
    })
}

fn parse_gencost_row(values: &[f64], row_idx: usize) -> Result<CostRecord> {
    let code = safe_f64_to_i32(values[0])
        .with_context(|| format!("invalid cost model at row {}", row_idx))?;
    let model = CostModelKind::from_code(code)
        .ok_or_else(|| anyhow!("unknown cost model {} at row {}", code, row_idx))?;
    let row = CostRecord {
        model,
        startup: values[1],
        shutdown: values[2],
        ncost: safe_f64_to_usize(values[3])
            .with_context(|| format!("invalid ncost at row {}", row_idx))?,
        cost: values[GENCOST_COLUMNS..].to_vec(),
    };
    if row.cost.len() < row.columns_needed() {
        return Err(anyhow!(
            "mpc.gencost row {} has ncost {} but only {} cost columns (needs {})",
            row_idx,
            row.ncost,
            row.cost.len(),
            row.columns_needed()
        ));
    }
    Ok(row)
}

/// Replace the `mpc.gen` and `mpc.gencost` matrices in `original`.
///
/// All other lines are copied through unchanged. If the original has no
/// `mpc.gencost` matrix, one is appended.
pub fn rewrite_case(original: &str, gen: &[GenRecord], gencost: &CostTable) -> Result<String> {
    let mut out = String::with_capacity(original.len());
    let mut wrote_gencost = false;
    let mut lines = original.lines();

    while let Some(line) = lines.next() {
        let trimmed = strip_comment(line).trim();
        let replacement = if is_matrix_header(trimmed, "mpc.gencost") {
            wrote_gencost = true;
            Some(true)
        } else if is_matrix_header(trimmed, "mpc.gen") {
            Some(false)
        } else {
            None
        };

        match replacement {
            Some(is_cost) => {
                if !is_matrix_end(trimmed) {
                    skip_matrix(&mut lines);
                }
                if is_cost {
                    write_gencost_matrix(&mut out, gencost)?;
                } else {
                    write_gen_matrix(&mut out, gen)?;
                }
            }
            None => {
                out.push_str(line);
                out.push('\n');
            }
        }
    }

    if !wrote_gencost && !gencost.is_empty() {
        writeln!(out)?;
        writeln!(out, "%% generator cost data")?;
        writeln!(out, "%\t1\tstartup\tshutdown\tn\tx1\ty1\t...\txn\tyn")?;
        writeln!(out, "%\t2\tstartup\tshutdown\tn\tc(n-1)\t...\tc0")?;
        write_gencost_matrix(&mut out, gencost)?;
    }

    Ok(out)
}

fn skip_matrix<'a>(lines: &mut impl Iterator<Item = &'a str>) {
    for line in lines {
        if is_matrix_end(strip_comment(line)) {
            break;
        }
    }
}

/// Write `mpc.gen = [ ... ];`
pub fn write_gen_matrix(out: &mut String, gen: &[GenRecord]) -> std::fmt::Result {
    writeln!(out, "mpc.gen = [")?;
    for g in gen {
        write!(
            out,
            "\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            g.bus,
            fmt_num(g.pg),
            fmt_num(g.qg),
            fmt_num(g.qmax),
            fmt_num(g.qmin),
            fmt_num(g.vg),
            fmt_num(g.mbase),
            u8::from(g.status),
            fmt_num(g.pmax),
            fmt_num(g.pmin)
        )?;
        for v in &g.extra {
            write!(out, "\t{}", fmt_num(*v))?;
        }
        writeln!(out, ";")?;
    }
    writeln!(out, "];")
}

/// Write `mpc.gencost = [ ... ];`
///
/// Rows are zero-padded to the table width so the matrix is rectangular.
pub fn write_gencost_matrix(out: &mut String, gencost: &CostTable) -> std::fmt::Result {
    let columns = gencost.width() - COST;
    writeln!(out, "mpc.gencost = [")?;
    for row in &gencost.rows {
        write!(
            out,
            "\t{}\t{}\t{}\t{}",
            row.model.code(),
            fmt_num(row.startup),
            fmt_num(row.shutdown),
            row.ncost
        )?;
        for i in 0..columns {
            let value = row.cost.get(i).copied().unwrap_or(0.0);
            write!(out, "\t{}", fmt_num(value))?;
        }
        writeln!(out, ";")?;
    }
    writeln!(out, "];")
}

/// Shortest representation that parses back to the same value; `-0` prints as `0`
fn fmt_num(v: f64) -> String {
    if v == 0.0 {
        "0".to_string()
    } else {
        format!("{}", v)
    }
}
