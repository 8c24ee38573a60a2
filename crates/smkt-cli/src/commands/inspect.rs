//! Generator and cost-curve listing for a case file.

use std::io::{self, Write};
use std::path::Path;

use anyhow::Result;
use serde::Serialize;
use smkt_cli::OutputFormat;
use smkt_core::{CostModelKind, CostRecord, GenRecord};
use smkt_io::parse_case_file;
use tabwriter::TabWriter;

/// One generator row with its active cost curve, for JSON output
#[derive(Serialize)]
struct UnitInfo {
    unit: usize,
    bus: usize,
    role: &'static str,
    status: bool,
    pmin: f64,
    pmax: f64,
    qmin: f64,
    qmax: f64,
    model: &'static str,
    ncost: usize,
    /// Cost at the operating limit farthest from zero
    cost_at_limit: f64,
    /// Marginal cost at the same point
    marginal_at_limit: f64,
    /// PWL breakpoints, empty for polynomial rows
    breakpoints: Vec<(f64, f64)>,
}

fn unit_info(unit: usize, g: &GenRecord, cost: &CostRecord) -> UnitInfo {
    let limit = if g.is_load() { g.pmin } else { g.pmax };
    let model = cost.cost_model();
    UnitInfo {
        unit,
        bus: g.bus,
        role: if g.is_load() { "load" } else { "gen" },
        status: g.status,
        pmin: g.pmin,
        pmax: g.pmax,
        qmin: g.qmin,
        qmax: g.qmax,
        model: match cost.model {
            CostModelKind::PiecewiseLinear => "pwl",
            CostModelKind::Polynomial => "poly",
        },
        ncost: cost.ncost,
        cost_at_limit: model.evaluate(limit),
        marginal_at_limit: model.marginal_cost(limit),
        breakpoints: cost.breakpoints(),
    }
}

pub fn handle(case: &Path, format: OutputFormat) -> Result<()> {
    let mpc = parse_case_file(case)?;
    let units: Vec<UnitInfo> = mpc
        .gen
        .iter()
        .zip(&mpc.gencost.rows)
        .enumerate()
        .map(|(i, (g, c))| unit_info(i, g, c))
        .collect();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&units)?);
        return Ok(());
    }

    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "UNIT\tBUS\tROLE\tON\tPMIN\tPMAX\tQMIN\tQMAX\tMODEL\tNCOST\tCOST@LIM\tMC@LIM"
    )?;
    for u in &units {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{:.2}\t{:.2}",
            u.unit,
            u.bus,
            u.role,
            if u.status { "yes" } else { "no" },
            u.pmin,
            u.pmax,
            u.qmin,
            u.qmax,
            u.model,
            u.ncost,
            u.cost_at_limit,
            u.marginal_at_limit,
        )?;
    }
    writer.flush()?;

    println!();
    println!(
        "Total: {} units, {} cost rows{}",
        mpc.gen.len(),
        mpc.gencost.len(),
        if mpc.gencost.has_reactive_block(mpc.gen.len()) {
            " (reactive block present)"
        } else {
            ""
        }
    );
    Ok(())
}
