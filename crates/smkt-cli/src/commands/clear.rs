use std::fs;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use smkt_cli::{ClearArgs, OutputFormat, SmktConfig};
use smkt_clear::{offers_to_case, ClearingResult};
use smkt_io::{load_submissions, parse_case_string, rewrite_case, ClearingReport};
use tabwriter::TabWriter;
use tracing::info;

pub fn handle(args: &ClearArgs, config: &SmktConfig) -> Result<()> {
    let original = fs::read_to_string(&args.case)
        .with_context(|| format!("reading case file: {}", args.case.display()))?;
    let case = parse_case_string(&original)
        .with_context(|| format!("parsing case file: {}", args.case.display()))?;
    let sub = load_submissions(&args.submissions)?;
    info!(
        case = %args.case.display(),
        units = case.gen.len(),
        cost_rows = case.gencost.len(),
        "loaded market case"
    );

    let clearing = args.clearing_config(&config.clearing);
    let limits = match sub.limits {
        Some(lim) => lim.or(&config.limits),
        None => config.limits,
    };

    let result = offers_to_case(
        &case.gen,
        &case.gencost,
        &sub.offers,
        sub.bids.as_ref(),
        Some(&limits),
        &clearing,
    )
    .with_context(|| format!("clearing offers for {}", args.case.display()))?;

    if let Some(output) = &args.output {
        let text = rewrite_case(&original, &result.gen, &result.gencost)?;
        fs::write(output, text)
            .with_context(|| format!("writing cleared case: {}", output.display()))?;
        info!("wrote cleared case to {}", output.display());
    }

    let report = ClearingReport::from_result(args.case.display().to_string(), &result);
    if let Some(path) = &args.report {
        report.write_json(path)?;
        info!("wrote clearing report to {}", path.display());
    }

    match args.format {
        OutputFormat::Json => println!("{}", report.to_json()?),
        OutputFormat::Table => print_table(&args.case, &result)?,
    }
    Ok(())
}

fn print_table(case: &Path, result: &ClearingResult) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(
        writer,
        "UNIT\tROLE\tSTATE\tPMIN\tPMAX\tQMIN\tQMAX\tP PTS\tQ PTS\tISSUES"
    )?;
    for (outcome, g) in result.outcomes.iter().zip(&result.gen) {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            outcome.unit,
            if outcome.is_load { "load" } else { "gen" },
            outcome.state.as_str(),
            g.pmin,
            g.pmax,
            g.qmin,
            g.qmax,
            outcome.p_points,
            outcome.q_points,
            result.diagnostics.for_unit(outcome.unit).count(),
        )?;
    }
    writer.flush()?;

    println!();
    println!(
        "{}: {} units, {} shut down, gencost width {}",
        case.display(),
        result.gen.len(),
        result.shut_down().count(),
        result.gencost.width()
    );
    print!("{}", result.diagnostics);
    Ok(())
}
