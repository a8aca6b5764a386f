//! missionc — compile mission DSL files into mission-host Python modules.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};

use missionc::config::CompilerConfig;
use missionc::driver::{self, WaypointSource};
use missionc::error::{MissionError, Result};
use missionc::logging;
use missionc::waypoint::PartitionPlan;

#[derive(Parser)]
#[command(name = "missionc", version)]
#[command(about = "Mission DSL compiler for multi-vehicle survey missions", long_about = None)]
struct Cli {
    /// Config file (default: ~/.missionc/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a mission for every vehicle and write the outputs
    Compile {
        /// Mission DSL file
        dsl: PathBuf,
        /// Placemark (KML) file to partition across the vehicles
        #[arg(long, conflicts_with = "waypoints")]
        kml: Option<PathBuf>,
        /// Waypoint dictionary (JSON) shared by every vehicle
        #[arg(long)]
        waypoints: Option<PathBuf>,
        /// Comma-separated vehicle IDs
        #[arg(long, value_delimiter = ',')]
        vehicles: Vec<String>,
        /// Base altitude for partitioned waypoints
        #[arg(long)]
        altitude: Option<f64>,
        /// Output root directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Partition a placemark file and print the per-vehicle dictionaries
    Partition {
        /// Placemark (KML) file
        kml: PathBuf,
        /// Comma-separated vehicle IDs
        #[arg(long, value_delimiter = ',')]
        vehicles: Vec<String>,
        /// Base altitude
        #[arg(long)]
        altitude: Option<f64>,
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Parse and validate a mission without generating code
    Check {
        /// Mission DSL file
        dsl: PathBuf,
        /// Waypoint dictionary (JSON)
        #[arg(long)]
        waypoints: Option<PathBuf>,
    },
}

fn apply_overrides(
    config: &mut CompilerConfig,
    vehicles: Vec<String>,
    altitude: Option<f64>,
) -> Result<()> {
    let vehicles: Vec<String> = vehicles
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if !vehicles.is_empty() {
        config.vehicles = vehicles;
    }
    if let Some(altitude) = altitude {
        config.altitude_base = altitude;
    }
    driver::check_vehicles(&config.vehicles)
}

fn write_or_print(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, contents).map_err(|source| MissionError::Io {
            path: path.to_path_buf(),
            source,
        }),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(contents.as_bytes())
                .and_then(|_| stdout.write_all(b"\n"))
                .map_err(|source| MissionError::Io {
                    path: PathBuf::from("<stdout>"),
                    source,
                })
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = CompilerConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Compile {
            dsl,
            kml,
            waypoints,
            vehicles,
            altitude,
            output,
        } => {
            apply_overrides(&mut config, vehicles, altitude)?;
            if let Some(output) = output {
                config.output_root = output;
            }
            let source = match (kml, waypoints) {
                (Some(kml), _) => WaypointSource::Kml(kml),
                (None, Some(dict)) => WaypointSource::Dictionary(dict),
                (None, None) => WaypointSource::None,
            };
            let written = driver::compile_to_disk(&dsl, &source, &config)?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
        Commands::Partition {
            kml,
            vehicles,
            altitude,
            output,
        } => {
            apply_overrides(&mut config, vehicles, altitude)?;
            let plan = PartitionPlan {
                vehicles: config.vehicles.clone(),
                altitude_base: config.altitude_base,
                altitude_step: config.altitude_step,
            };
            let report = driver::partition_file(&kml, &plan)?;
            let json = serde_json::to_string_pretty(&report.assignment)?;
            write_or_print(output.as_deref(), &json)
        }
        Commands::Check { dsl, waypoints } => {
            let mission = driver::check(&dsl, waypoints.as_deref())?;
            print!("{}", driver::summarize(&mission));
            Ok(())
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
