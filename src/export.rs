use anyhow::{Context, Result};
use log::{info, warn};

use crate::{
    cli::ExportArgs, dataset::DatasetView, filter, io_utils, loader::DatasetLoader,
    record::ColumnName,
};

/// Writes `view` in the canonical column layout, header first. An empty view
/// produces a header-only file.
pub fn write_view<W: std::io::Write>(writer: &mut csv::Writer<W>, view: &DatasetView<'_>) -> Result<()> {
    writer
        .write_record(ColumnName::headers())
        .context("Writing output headers")?;
    for (idx, row) in view.to_rows().iter().enumerate() {
        writer
            .write_record(row)
            .with_context(|| format!("Writing output row {}", idx + 1))?;
    }
    writer.flush().context("Flushing output")?;
    Ok(())
}

pub fn execute(args: &ExportArgs) -> Result<()> {
    let loader = DatasetLoader::from_args(&args.dataset)?;
    let outcome = loader.get();
    let view = filter::apply_args(&outcome.dataset, &args.filters)?;
    if view.is_empty() {
        warn!("No rows match the current filters; writing headers only");
    }

    let delimiter = args.output_delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER);
    let mut writer = io_utils::open_csv_writer(args.output.as_deref(), delimiter)?;
    write_view(&mut writer, &view)?;
    info!(
        "Exported {} row(s) to {}",
        view.len(),
        args.output
            .as_deref()
            .filter(|p| !io_utils::is_dash(p))
            .map(|p| format!("{p:?}"))
            .unwrap_or_else(|| "stdout".to_string())
    );
    Ok(())
}
