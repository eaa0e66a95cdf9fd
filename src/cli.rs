//! Command-line interface: one trip request in, one plan out

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::PathBuf;

use chrono::{NaiveDate, Weekday};
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::agents::route::catalog::ROUTES;
use crate::config::PlanningMode;
use crate::models::{Preferences, PriceTier, TravelWindow, TripRequest};

/// Plan a multi-day Yellowstone trip: dates, weather, route and dining
#[derive(Debug, Parser)]
#[command(name = "tripplan", version, about)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured planning mode
    #[arg(short, long, global = true, value_enum)]
    pub mode: Option<PlanningMode>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a trip
    Plan(PlanArgs),

    /// List the routes a trip can follow
    Routes,
}

#[derive(Debug, Clone, Args)]
pub struct PlanArgs {
    /// Where the trip starts, e.g. "Denver, CO"
    #[arg(long)]
    pub start: String,

    /// Earliest travel date
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub from: NaiveDate,

    /// Latest travel date
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub to: NaiveDate,

    /// Trip length in days (1-14)
    #[arg(long)]
    pub days: u8,

    /// Route id; see `tripplan routes`
    #[arg(long, default_value = "classic")]
    pub route: String,

    /// Highest price tier for restaurants (budget, moderate, expensive)
    #[arg(long, default_value = "moderate")]
    pub budget: PriceTier,

    /// Preferred cuisine; repeat for several
    #[arg(long = "cuisine", value_name = "CUISINE")]
    pub cuisines: Vec<String>,

    /// Favour trail-friendly restaurants
    #[arg(long)]
    pub hiking: bool,

    /// Favour accessible restaurants
    #[arg(long)]
    pub accessible: bool,

    /// Start the trip on this weekday when possible
    #[arg(long, value_name = "WEEKDAY")]
    pub start_weekday: Option<Weekday>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

impl PlanArgs {
    #[must_use]
    pub fn to_request(&self) -> TripRequest {
        let cuisines: BTreeSet<String> = self
            .cuisines
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();
        TripRequest {
            starting_location: self.start.trim().to_string(),
            window: TravelWindow::new(self.from, self.to),
            duration_days: self.days,
            preferences: Preferences {
                dining_budget: self.budget,
                cuisines,
                hiking_interest: self.hiking,
                accessibility_needs: self.accessible,
                preferred_start_weekday: self.start_weekday,
            },
            route_id: self.route.trim().to_string(),
        }
    }
}

/// Catalog listing for `tripplan routes`
#[must_use]
pub fn render_routes() -> String {
    let mut out = String::from("🗺️  Available routes\n");
    for route in ROUTES {
        let _ = writeln!(out, "\n  {} ({})", route.name, route.id);
        let _ = writeln!(out, "    {}", route.description);
        let stops: Vec<&str> = std::iter::once(route.gateway.name)
            .chain(route.sights.iter().map(|s| s.name))
            .chain(route.returns_to_gateway.then_some(route.gateway.name))
            .collect();
        let _ = writeln!(out, "    {}", stops.join(" → "));
    }
    out
}
