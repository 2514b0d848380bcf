use clap::Parser;
use rank_processor::{
    args::Args,
    feed::{
        export::CsvReportWriter,
        loader::{load_prior_ranks, load_result_feed, SeasonFilter}
    },
    model::{config::FormulaConfig, error::RankError, report::write_season, season::SeasonAggregator}
};
use tracing::{error, info};
use tracing_indicatif::IndicatifLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();

    let indicatif_layer = IndicatifLayer::new();
    tracing_subscriber::registry()
        .with(EnvFilter::new(&args.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(indicatif_layer.get_stderr_writer()))
        .with(indicatif_layer)
        .init();

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), RankError> {
    let config = match &args.formula_config {
        Some(path) => FormulaConfig::from_json_file(path)?,
        None => {
            let config = FormulaConfig::default();
            config.validate()?;
            info!("Using the built-in formula configuration");
            config
        }
    };

    let config = config.for_rank_kind(args.rank_kind);
    info!(
        kind = args.rank_kind.label(),
        races_exempt_from_best_share = config.races_exempt_from_best_share,
        races_exempt_from_comparative_rank = config.races_exempt_from_comparative_rank,
        "Rank kind selected"
    );

    let filter = SeasonFilter {
        kind: args.rank_kind,
        year: args.season,
        close_season: args.close_season
    };
    let feed = load_result_feed(&args.results_feed, &config, &filter)?;
    let prior = match &args.prior_season {
        Some(path) => load_prior_ranks(path)?,
        None => Vec::new()
    };

    let result = SeasonAggregator::new(&config).run(&feed.races, &prior)?;

    let mut writer = CsvReportWriter::new(&args.output_dir)?;
    let tables = write_season(&result, args.rank_kind, &mut writer)?;

    info!(
        tables,
        output_dir = %args.output_dir.display(),
        kind = args.rank_kind.label(),
        rejected_rows = feed.tally.rejected,
        excluded_records = result.state.tally.records,
        excluded_races = result.state.tally.races,
        "Reports written"
    );

    match result.final_snapshot() {
        Some(snapshot) => info!(race_id = %snapshot.race_id, "Season closed, final ranks frozen"),
        None => info!("Season still open, no final ranks")
    }

    Ok(())
}
