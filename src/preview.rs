use anyhow::Result;
use log::info;

use crate::{cli::PreviewArgs, filter, loader::DatasetLoader, table};

pub fn execute(args: &PreviewArgs) -> Result<()> {
    let loader = DatasetLoader::from_args(&args.dataset)?;
    let outcome = loader.get();
    let view = filter::apply_args(&outcome.dataset, &args.filters)?;
    if filter::warn_if_empty(&view) {
        return Ok(());
    }

    // Optional columns no row fills would only add blank space.
    let columns = outcome.dataset.columns();
    let headers = columns
        .iter()
        .map(|c| c.as_str().to_string())
        .collect::<Vec<_>>();
    let rows = view
        .head(args.rows)
        .iter()
        .map(|record| columns.iter().map(|c| record.cell(*c)).collect())
        .collect::<Vec<Vec<String>>>();

    table::print_table(&headers, &rows);
    info!(
        "Displayed {} of {} matching row(s) from {} source(s)",
        rows.len(),
        view.len(),
        outcome.dataset.sources().len()
    );
    Ok(())
}
