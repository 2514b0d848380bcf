use std::path::PathBuf;

use clap::Parser;

use crate::model::structures::rank_kind::RankKind;

#[derive(Parser, Clone, Debug)]
#[command(
    display_name = "Rank Processor",
    long_about = "Computes the rolling orienteering rank of a season from prepared race protocols"
)]
pub struct Args {
    /// JSON file with race type coefficients, level bonuses, base group ranks and penalty bands.
    /// Built-in defaults are used when omitted.
    #[arg(short = 'c', long, env = "RANK_FORMULA_CONFIG", help = "Formula configuration file")]
    pub formula_config: Option<PathBuf>,

    #[arg(short = 'f', long, env = "RANK_RESULTS_FEED", help = "Race results feed (JSON)")]
    pub results_feed: PathBuf,

    /// CSV with columns surname, given_name, birth_year, sex, final_rank
    #[arg(short, long, env = "RANK_PRIOR_SEASON", help = "Previous season's final ranks")]
    pub prior_season: Option<PathBuf>,

    #[arg(short, long, env = "RANK_OUTPUT_DIR", default_value = "rank", help = "Directory for report tables")]
    pub output_dir: PathBuf,

    /// Races outside this season are ignored. For the winter rank, December
    /// races belong to the following year.
    #[arg(short, long, env = "RANK_SEASON", help = "Season year")]
    pub season: Option<i32>,

    /// Forest and sprint ranks take their own exemption periods from the formula configuration
    #[arg(short = 'k', long, env = "RANK_KIND", value_enum, default_value = "summer")]
    pub rank_kind: RankKind,

    /// Treat the last race of the feed as the season final and freeze final ranks
    #[arg(long, env = "RANK_CLOSE_SEASON", action = clap::ArgAction::SetTrue)]
    pub close_season: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        short,
        long,
        env = "RUST_LOG",
        default_value = "info",
        value_parser = ["trace", "debug", "info", "warn", "error"],
        help = "Sets the logging verbosity"
    )]
    pub log_level: String
}
