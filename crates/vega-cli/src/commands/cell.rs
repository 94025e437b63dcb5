//! Hex cell lookup

use clap::Args;
use colored::Colorize;
use serde::Serialize;
use vega_analytics::{HexCell, HexGrid};

use crate::config::VegaConfig;
use crate::error::CliResult;
use crate::output::OutputFormat;

/// Arguments of `vega cell`
#[derive(Args, Debug, Clone)]
pub struct CellArgs {
    /// Latitude of the position to bin
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    /// Longitude of the position to bin
    #[arg(long, allow_hyphen_values = true)]
    pub lng: f64,

    /// Grid origin latitude (overrides the config file)
    #[arg(long, allow_hyphen_values = true)]
    pub origin_lat: Option<f64>,

    /// Grid origin longitude (overrides the config file)
    #[arg(long, allow_hyphen_values = true)]
    pub origin_lng: Option<f64>,

    /// Hexagon size, center to corner, meters (overrides the config file)
    #[arg(long)]
    pub cell_size: Option<f64>,
}

#[derive(Debug, Serialize)]
struct CellLookup {
    cell_id: String,
    cell: HexCell,
    center_lat: f64,
    center_lng: f64,
    cell_size_m: f64,
}

/// Execute `vega cell`
pub fn execute(args: CellArgs, config: &VegaConfig, format: OutputFormat) -> CliResult<()> {
    let grid = HexGrid::new(
        args.origin_lat.unwrap_or(config.grid.origin_lat),
        args.origin_lng.unwrap_or(config.grid.origin_lng),
        args.cell_size.unwrap_or(config.grid.cell_size_m),
    )?;
    let lookup = lookup(&grid, args.lat, args.lng);

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&lookup)?);
        }
        OutputFormat::Table => {
            println!("{}", "Hex Cell".bold().cyan());
            println!("{}", "=".repeat(40));
            println!("  Cell:    {}", lookup.cell_id.bold());
            println!(
                "  Center:  {:.6}, {:.6}",
                lookup.center_lat, lookup.center_lng
            );
            println!("  Size:    {} m", lookup.cell_size_m);
        }
    }
    Ok(())
}

fn lookup(grid: &HexGrid, lat: f64, lng: f64) -> CellLookup {
    let cell = grid.cell_at(lat, lng);
    let (center_lat, center_lng) = grid.cell_center(cell);
    CellLookup {
        cell_id: cell.to_string(),
        cell,
        center_lat,
        center_lng,
        cell_size_m: grid.cell_size_m,
    }
}
