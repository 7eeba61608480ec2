use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{
    record::{ColumnName, WorkMode},
    stats::DEFAULT_MIN_GROUP_SIZE,
};

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Normalize and explore workplace mental-health survey exports",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the first rows of the unified, filtered table
    Preview(PreviewArgs),
    /// Write the unified, filtered table as CSV
    Export(ExportArgs),
    /// Headline indicators for the filtered rows compared with every row
    Summary(SummaryArgs),
    /// Respondents, mean stress, mean hours, and high-burnout share per group
    Group(GroupArgs),
    /// Share of low, medium, and high burnout within each group
    Composition(CompositionArgs),
    /// Value counts and shares for one column
    Frequency(FrequencyArgs),
    /// Pearson correlation among stress, hours, and burnout
    Correlate(CorrelateArgs),
    /// High-burnout gap between two work modes within each group
    Delta(DeltaArgs),
    /// Print the source profiles as YAML
    Profiles(ProfilesArgs),
}

/// Where the survey sources live and how to read them.
#[derive(Debug, Clone, Args)]
pub struct DatasetArgs {
    /// Directory holding the three survey exports
    #[arg(long = "data-dir", default_value = "data")]
    pub data_dir: PathBuf,
    /// Explicit source file; repeat to load several (replaces the defaults)
    #[arg(long = "source", action = clap::ArgAction::Append)]
    pub sources: Vec<PathBuf>,
    /// YAML file with source profiles replacing the built-in ones
    #[arg(long)]
    pub profiles: Option<PathBuf>,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the source files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    /// Keep only these roles (comma-separated or repeated)
    #[arg(long = "role", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub roles: Vec<String>,
    /// Keep only these work modes: remote, hybrid, onsite
    #[arg(
        long = "work-mode",
        value_delimiter = ',',
        value_parser = parse_work_mode,
        action = clap::ArgAction::Append
    )]
    pub work_modes: Vec<WorkMode>,
    /// Keep only these segments; rows without a segment are dropped
    #[arg(long = "segment", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub segments: Vec<String>,
    /// Lowest weekly hours to keep (inclusive)
    #[arg(long = "min-hours")]
    pub min_hours: Option<f64>,
    /// Highest weekly hours to keep (inclusive)
    #[arg(long = "max-hours")]
    pub max_hours: Option<f64>,
    /// Extra conditions such as `stress_score >= 7` or `policy contains support`
    #[arg(long = "where", action = clap::ArgAction::Append)]
    pub conditions: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter for the output (defaults to ',')
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct GroupArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Categorical column to group by (role, work_mode, segment, policy, ...)
    #[arg(long, value_parser = parse_column)]
    pub by: ColumnName,
    /// Hide groups with fewer respondents than this
    #[arg(long = "min-count", default_value_t = DEFAULT_MIN_GROUP_SIZE)]
    pub min_count: usize,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CompositionArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Categorical column to split by
    #[arg(long, value_parser = parse_column, default_value = "policy")]
    pub by: ColumnName,
    /// Hide groups with fewer respondents than this
    #[arg(long = "min-count", default_value_t = DEFAULT_MIN_GROUP_SIZE)]
    pub min_count: usize,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct FrequencyArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Columns to count values for (comma-separated or repeated)
    #[arg(
        short = 'C',
        long = "column",
        required = true,
        value_delimiter = ',',
        value_parser = parse_column,
        action = clap::ArgAction::Append
    )]
    pub columns: Vec<ColumnName>,
    /// Maximum distinct values to display per column (0 = all)
    #[arg(long, default_value_t = 0)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct CorrelateArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DeltaArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,
    #[command(flatten)]
    pub filters: FilterArgs,
    /// Categorical column whose groups are compared
    #[arg(long, value_parser = parse_column, default_value = "role")]
    pub by: ColumnName,
    /// The two work modes to compare, first minus second
    #[arg(
        long,
        value_delimiter = ',',
        value_parser = parse_work_mode,
        default_values_t = [WorkMode::Remote, WorkMode::Onsite]
    )]
    pub modes: Vec<WorkMode>,
    /// Minimum respondents per work mode within a group
    #[arg(long = "min-count", default_value_t = DEFAULT_MIN_GROUP_SIZE)]
    pub min_count: usize,
}

#[derive(Debug, Args)]
pub struct ProfilesArgs {
    /// Profiles YAML to validate and print instead of the built-in set
    #[arg(long)]
    pub profiles: Option<PathBuf>,
    /// Output file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

pub fn parse_column(value: &str) -> Result<ColumnName, String> {
    value.parse().map_err(|err: anyhow::Error| err.to_string())
}

pub fn parse_work_mode(value: &str) -> Result<WorkMode, String> {
    value.parse().map_err(|err: anyhow::Error| err.to_string())
}
