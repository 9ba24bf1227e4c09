use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use gridreduce_algo::RegionMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridreduce", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// TOML configuration file ([regions], [simplify], [aggregation])
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build onshore and offshore bus regions
    Regions {
        #[command(flatten)]
        regions: RegionArgs,
        /// Directory for the region GeoJSON files
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: PathBuf,
        /// Also write the network with reassigned zones (and pruned buses) here
        #[arg(long, value_hint = ValueHint::DirPath)]
        network_out: Option<PathBuf>,
    },
    /// Reduce a network to one bus per substation
    Simplify {
        /// Network directory (buses.csv, lines.csv, ...)
        #[arg(long, value_hint = ValueHint::DirPath)]
        network: PathBuf,
        #[command(flatten)]
        simplify: SimplifyArgs,
        /// Output network directory (also receives busmap.csv)
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: PathBuf,
    },
    /// Build regions, then simplify the region-pruned network
    Run {
        #[command(flatten)]
        regions: RegionArgs,
        #[command(flatten)]
        simplify: SimplifyArgs,
        /// Output directory (regions, network/, busmap.csv)
        #[arg(short, long, value_hint = ValueHint::DirPath)]
        out: PathBuf,
    },
    /// Print network statistics and input problems
    Inspect {
        /// Network directory
        #[arg(long, value_hint = ValueHint::DirPath)]
        network: PathBuf,
        #[arg(long, value_enum, default_value_t = InspectFormat::Plain)]
        format: InspectFormat,
    },
}

#[derive(Args, Debug, Clone)]
pub struct RegionArgs {
    /// Network directory (buses.csv, lines.csv, ...)
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub network: PathBuf,
    /// Onshore outlines (GeoJSON, one feature per country or authority)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub onshore: PathBuf,
    /// Offshore outlines (GeoJSON)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub offshore: Option<PathBuf>,
    /// Partitioning mode (overrides the config file)
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,
    /// Comma-separated zones to partition (overrides the config file)
    #[arg(long, value_delimiter = ',')]
    pub zones: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct SimplifyArgs {
    /// Site-to-substation table (bus_id,sub_id)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub bus2sub: PathBuf,
    /// Substation table (sub_id,lon,lat,interconnect)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub substations: PathBuf,
    /// Voltage layer in kV (overrides the config file)
    #[arg(long)]
    pub voltage_level: Option<f64>,
    /// Label aggregated buses with their members' zone
    #[arg(long)]
    pub use_ba_zones: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Country,
    Authority,
}

impl From<ModeArg> for RegionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Country => RegionMode::Country,
            ModeArg::Authority => RegionMode::Authority,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum InspectFormat {
    Plain,
    Json,
}
