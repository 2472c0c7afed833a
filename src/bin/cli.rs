//! Fairline CLI - fair odds, favorite backtests and calibration reports

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use fairline::backtesting::metrics::{
    analyze_by_odds_range, analyze_by_side, calculate_sharpe_ratio,
};
use fairline::backtesting::{
    cumulative_profit, BacktestConfig, FavoriteBacktester, SyntheticOddsGenerator,
};
use fairline::core::{CalibrationBin, MarginPolicy};
use fairline::data::load_matches;
use fairline::evaluation::{evaluate, Evaluation, EvaluationOptions};
use fairline::{OddsRow, Outcome};

#[cfg(feature = "fetch")]
use fairline::client::OddsApiClient;
#[cfg(feature = "fetch")]
use fairline::config::OddsApiConfig;
#[cfg(feature = "fetch")]
use fairline::data::{write_matches, OddsEvent};

const DEFAULT_MATCHES_CSV: &str = "data/matches.csv";

#[derive(Parser)]
#[command(name = "fairline")]
#[command(author, version, about = "Fair odds and favorite backtests", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run in interactive mode
    #[arg(short, long)]
    interactive: bool,
}

#[derive(clap::Args, Clone)]
struct AnalysisArgs {
    /// Margin removal policy (uniform or weighted)
    #[arg(long, default_value = "uniform")]
    policy: MarginPolicy,

    /// Level stake per bet
    #[arg(long, default_value = "10")]
    stake: f64,

    /// Number of calibration bins
    #[arg(long, default_value = "10")]
    bins: usize,

    /// Write calibration and profit charts (SVG) into this directory
    #[arg(long)]
    plot_dir: Option<PathBuf>,

    /// Print the full evaluation as JSON instead of tables
    #[arg(long)]
    json: bool,
}

impl AnalysisArgs {
    fn options(&self) -> EvaluationOptions {
        EvaluationOptions {
            policy: self.policy,
            stake: self.stake,
            bins: self.bins,
        }
    }
}

impl Default for AnalysisArgs {
    fn default() -> Self {
        Self {
            policy: MarginPolicy::Uniform,
            stake: 10.0,
            bins: 10,
            plot_dir: None,
            json: false,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// De-vig, backtest and calibrate a CSV of settled matches
    Analyze {
        /// CSV with home_odds, away_odds and outcome columns
        #[arg(short, long, default_value = DEFAULT_MATCHES_CSV)]
        input: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Run the analysis on a synthetic season with a known margin
    Demo {
        /// Number of matches to generate
        #[arg(long, default_value = "500")]
        matches: usize,

        /// Bookmaker margin baked into the quotes
        #[arg(long, default_value = "0.05")]
        margin: f64,

        /// Random seed
        #[arg(long, default_value = "42")]
        seed: u64,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Fetch odds and scores from The Odds API into a match CSV
    #[cfg(feature = "fetch")]
    Fetch {
        /// Sport key (defaults to ODDS_SPORT or basketball_nba)
        #[arg(short, long)]
        sport: Option<String>,

        /// Days of completed scores to request (1-3)
        #[arg(long)]
        days_from: Option<u32>,

        /// Preferred bookmaker key
        #[arg(long)]
        bookmaker: Option<String>,

        /// Output CSV path
        #[arg(short, long, default_value = DEFAULT_MATCHES_CSV)]
        output: PathBuf,

        /// Save the raw odds payload as JSON in this directory
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,

        /// Reuse a saved odds payload instead of requesting odds again
        #[arg(long)]
        odds_snapshot: Option<PathBuf>,
    },

    /// List in-season sports on The Odds API
    #[cfg(feature = "fetch")]
    Sports {
        /// Include out-of-season sports
        #[arg(long)]
        all: bool,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    println!(
        "{}",
        format!("Fairline CLI v{}", env!("CARGO_PKG_VERSION"))
            .cyan()
            .bold()
    );
    println!();

    if cli.interactive {
        run_interactive()?;
    } else if let Some(command) = cli.command {
        match command {
            Commands::Analyze { input, analysis } => {
                run_analyze(&input, &analysis)?;
            }
            Commands::Demo {
                matches,
                margin,
                seed,
                analysis,
            } => {
                run_demo(matches, margin, seed, &analysis)?;
            }
            #[cfg(feature = "fetch")]
            Commands::Fetch {
                sport,
                days_from,
                bookmaker,
                output,
                snapshot_dir,
                odds_snapshot,
            } => {
                let mut config = OddsApiConfig::from_env();
                if let Some(sport) = sport {
                    config = config.with_sport(sport);
                }
                if let Some(days) = days_from {
                    config = config.with_days_from(days);
                }
                if bookmaker.is_some() {
                    config.bookmaker = bookmaker;
                }
                run_fetch(config, &output, snapshot_dir.as_deref(), odds_snapshot.as_deref())?;
            }
            #[cfg(feature = "fetch")]
            Commands::Sports { all } => {
                list_sports(all)?;
            }
        }
    } else {
        println!("Use --help for usage information or --interactive for interactive mode.");
    }

    Ok(())
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Invalid spinner template")?,
    );
    pb.set_message(message.to_string());
    Ok(pb)
}

fn run_analyze(input: &Path, args: &AnalysisArgs) -> Result<()> {
    println!("{}: {:?}", "Analyzing".green(), input);
    println!();

    let pb = spinner("Loading matches...")?;
    let table = load_matches(input)
        .with_context(|| format!("Failed to load matches from {:?}", input))?;
    pb.finish_and_clear();

    if table.is_empty() {
        println!("{}", "No settled matches found.".yellow());
        return Ok(());
    }

    analyze(&table.odds, &table.outcomes, args)
}

fn run_demo(matches: usize, margin: f64, seed: u64, args: &AnalysisArgs) -> Result<()> {
    if !(0.0..1.0).contains(&margin) {
        anyhow::bail!("Margin must be in [0, 1), got {}", margin);
    }
    if matches == 0 {
        anyhow::bail!("Need at least one match");
    }

    println!(
        "{}: {} matches, {:.1}% margin, seed {}",
        "Synthetic season".green(),
        matches,
        margin * 100.0,
        seed
    );
    println!();

    let season = SyntheticOddsGenerator::new(margin).generate_season(matches, seed);
    analyze(&season.odds, &season.outcomes, args)?;
    if args.json {
        return Ok(());
    }

    let true_home: Vec<f64> = season.true_home_probs;
    let fair = fairline::core::normalize(args.policy, &season.odds)?;
    let mean_abs_err = fair
        .probs
        .iter()
        .zip(&true_home)
        .map(|(p, t)| (p.home_prob - t).abs())
        .sum::<f64>()
        / true_home.len() as f64;
    println!(
        "Mean |fair - true| home probability: {:.4} (quotes rounded to 2 dp)",
        mean_abs_err
    );

    Ok(())
}

fn analyze(odds: &[OddsRow], outcomes: &[Outcome], args: &AnalysisArgs) -> Result<()> {
    let evaluation = evaluate(odds, outcomes, &args.options()).context("Evaluation failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        print_market_summary(odds, &evaluation);

        let backtester = FavoriteBacktester::new(BacktestConfig { stake: args.stake });
        backtester.print_summary(&evaluation.backtest);
        print_breakdowns(&evaluation);

        print_calibration(evaluation.brier_score, &evaluation.calibration);
    }

    if let Some(dir) = &args.plot_dir {
        write_plots(dir, &evaluation)?;
    }

    Ok(())
}

fn print_market_summary(odds: &[OddsRow], evaluation: &Evaluation) {
    let home_favorites = evaluation
        .fair
        .probs
        .iter()
        .filter(|p| p.home_prob >= p.away_prob)
        .count();

    println!("{}", "Market Summary".yellow().bold());
    println!("{}", "-".repeat(60));
    println!("Matches: {}", evaluation.matches);
    println!("Policy: {}", evaluation.policy);
    println!("Average margin: {:.2}%", evaluation.avg_margin * 100.0);
    println!(
        "Home favorites: {} ({:.1}%)",
        home_favorites,
        home_favorites as f64 / evaluation.matches as f64 * 100.0
    );
    println!();

    println!(
        "  {:>4}  {:>8} {:>8}  {:>8} {:>8}  {:>8} {:>8}",
        "#", "Home", "Away", "FairH", "FairA", "P(H)", "P(A)"
    );
    for (i, ((raw, fair_odds), prob)) in odds
        .iter()
        .zip(&evaluation.fair.odds)
        .zip(&evaluation.fair.probs)
        .enumerate()
        .take(5)
    {
        println!(
            "  {:>4}  {:>8.2} {:>8.2}  {:>8.3} {:>8.3}  {:>8.3} {:>8.3}",
            i,
            raw.home_odds,
            raw.away_odds,
            fair_odds.home_odds,
            fair_odds.away_odds,
            prob.home_prob,
            prob.away_prob
        );
    }
    if evaluation.matches > 5 {
        println!("  ... {} more", evaluation.matches - 5);
    }
}

fn print_breakdowns(evaluation: &Evaluation) {
    let bets = &evaluation.backtest.bets;

    println!();
    println!("{}", "By Favorite Price".yellow().bold());
    println!("{}", "-".repeat(60));
    println!(
        "  {:<16} {:>6} {:>6} {:>8} {:>10} {:>8}",
        "Bucket", "Bets", "Wins", "Hit%", "Profit", "ROI%"
    );
    for row in analyze_by_odds_range(bets) {
        print_dimension(&row);
    }

    println!();
    println!("{}", "By Favorite Side".yellow().bold());
    println!("{}", "-".repeat(60));
    println!(
        "  {:<16} {:>6} {:>6} {:>8} {:>10} {:>8}",
        "Side", "Bets", "Wins", "Hit%", "Profit", "ROI%"
    );
    for row in analyze_by_side(bets) {
        print_dimension(&row);
    }

    println!();
    println!("Sharpe ratio (per bet): {:.3}", calculate_sharpe_ratio(bets, 0.0));
}

fn print_dimension(row: &fairline::backtesting::metrics::DimensionAnalysis) {
    let profit = format!("{:>10.2}", row.profit);
    let profit = if row.profit >= 0.0 {
        profit.green()
    } else {
        profit.red()
    };
    println!(
        "  {:<16} {:>6} {:>6} {:>7.1}% {} {:>7.1}%",
        row.key,
        row.bets,
        row.wins,
        row.hit_rate * 100.0,
        profit,
        row.roi * 100.0
    );
}

fn print_calibration(brier: f64, bins: &[CalibrationBin]) {
    println!();
    println!("{}", "Calibration".yellow().bold());
    println!("{}", "-".repeat(60));
    println!("Brier score: {:.4} (0 = perfect, 0.5 = coin flip)", brier);
    println!();
    println!(
        "  {:<13} {:>6} {:>10} {:>10} {:>8}",
        "Bin", "Count", "Predicted", "Observed", "Gap"
    );
    for bin in bins {
        println!(
            "  [{:.2}, {:.2}) {:>6} {:>10.3} {:>10.3} {:>+8.3}",
            bin.lower,
            bin.upper,
            bin.count,
            bin.avg_predicted,
            bin.observed_rate,
            bin.gap()
        );
    }
}

#[cfg(feature = "plot")]
fn write_plots(dir: &Path, evaluation: &Evaluation) -> Result<()> {
    use fairline::plot::{draw_calibration_chart, draw_cumulative_profit};

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create plot directory: {:?}", dir))?;

    let calibration_path = dir.join("calibration.svg");
    draw_calibration_chart(&calibration_path, &evaluation.calibration)?;

    let profit_path = dir.join("cumulative_profit.svg");
    draw_cumulative_profit(&profit_path, &cumulative_profit(&evaluation.backtest.profits()))?;

    println!();
    println!("{}: {:?}", "Saved".green(), calibration_path);
    println!("{}: {:?}", "Saved".green(), profit_path);
    Ok(())
}

#[cfg(not(feature = "plot"))]
fn write_plots(_dir: &Path, _evaluation: &Evaluation) -> Result<()> {
    println!("{}", "Plotting disabled (build with the plot feature).".yellow());
    Ok(())
}

#[cfg(feature = "fetch")]
fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")
}

#[cfg(feature = "fetch")]
fn read_snapshot(path: &Path) -> Result<Vec<OddsEvent>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read odds snapshot {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid odds snapshot {:?}", path))
}

#[cfg(feature = "fetch")]
fn write_snapshot(dir: &Path, sport: &str, odds: &[OddsEvent]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create snapshot directory: {:?}", dir))?;
    let filename = format!(
        "{}_odds_{}.json",
        sport,
        chrono::Utc::now().format("%Y%m%dT%H%M%S")
    );
    let path = dir.join(filename);
    std::fs::write(&path, serde_json::to_string_pretty(odds)?)
        .with_context(|| format!("Failed to write snapshot {:?}", path))?;
    Ok(path)
}

#[cfg(feature = "fetch")]
fn run_fetch(
    config: OddsApiConfig,
    output: &Path,
    snapshot_dir: Option<&Path>,
    odds_snapshot: Option<&Path>,
) -> Result<()> {
    println!(
        "{}: {} (regions {}, last {} day(s))",
        "Fetching".green(),
        config.sport,
        config.regions,
        config.days_from
    );
    println!();

    let client = OddsApiClient::new(config).context("Failed to create Odds API client")?;
    let rt = runtime()?;

    let records = if odds_snapshot.is_none() && snapshot_dir.is_none() {
        let pb = spinner("Requesting odds and scores...")?;
        let records = rt.block_on(client.fetch_records());
        pb.finish_and_clear();
        records.context("Failed to fetch odds and scores")?
    } else {
        let odds = match odds_snapshot {
            Some(path) => read_snapshot(path)?,
            None => {
                let pb = spinner("Requesting odds...")?;
                let events = rt.block_on(client.fetch_odds());
                pb.finish_and_clear();
                events.context("Failed to fetch odds")?
            }
        };
        println!("Events: {}", odds.len());

        if let Some(dir) = snapshot_dir {
            let path = write_snapshot(dir, &client.config().sport, &odds)?;
            println!("{}: {:?}", "Snapshot".green(), path);
        }

        let pb = spinner("Requesting scores...")?;
        let records = rt.block_on(client.settle(&odds));
        pb.finish_and_clear();
        records.context("Failed to fetch scores")?
    };

    let settled = records.iter().filter(|r| r.outcome.is_some()).count();
    println!("Two-way markets: {}  Settled: {}", records.len(), settled);

    if settled == 0 {
        println!("{}", "No settled matches yet; nothing written.".yellow());
        return Ok(());
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    let written = write_matches(output, &records)
        .with_context(|| format!("Failed to write matches to {:?}", output))?;
    println!("{}: {} matches -> {:?}", "Saved".green(), written, output);

    Ok(())
}

#[cfg(feature = "fetch")]
fn list_sports(all: bool) -> Result<()> {
    let client = OddsApiClient::new(OddsApiConfig::from_env())
        .context("Failed to create Odds API client")?;
    let rt = runtime()?;

    let pb = spinner("Requesting sports...")?;
    let sports = rt.block_on(client.list_sports());
    pb.finish_and_clear();
    let sports = sports.context("Failed to list sports")?;

    println!("{}", "Sports".yellow().bold());
    println!("{}", "-".repeat(60));
    for sport in sports.iter().filter(|s| all || s.active) {
        let key = if sport.has_outrights {
            sport.key.dimmed()
        } else {
            sport.key.normal()
        };
        println!("  {:<36} {}", key, sport.title);
    }

    Ok(())
}

fn run_interactive() -> Result<()> {
    println!("{}", "Interactive mode".green().bold());
    println!();

    let theme = ColorfulTheme::default();

    loop {
        let options = vec!["Analyze a match CSV", "Synthetic season demo", "Quit"];

        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(0)
            .interact()?;

        if selection == 2 {
            println!("Goodbye!");
            break;
        }

        let policies = ["uniform", "weighted"];
        let policy = Select::with_theme(&theme)
            .with_prompt("Margin policy")
            .items(&policies)
            .default(0)
            .interact()?;
        let stake: f64 = Input::with_theme(&theme)
            .with_prompt("Stake per bet")
            .default(10.0)
            .interact_text()?;

        let args = AnalysisArgs {
            policy: if policy == 1 {
                MarginPolicy::Weighted
            } else {
                MarginPolicy::Uniform
            },
            stake,
            ..Default::default()
        };

        println!();
        let outcome = match selection {
            0 => {
                let input: String = Input::with_theme(&theme)
                    .with_prompt("CSV path")
                    .default(DEFAULT_MATCHES_CSV.to_string())
                    .interact_text()?;
                run_analyze(Path::new(&input), &args)
            }
            _ => {
                let matches: usize = Input::with_theme(&theme)
                    .with_prompt("Matches")
                    .default(500)
                    .interact_text()?;
                let margin: f64 = Input::with_theme(&theme)
                    .with_prompt("Margin")
                    .default(0.05)
                    .interact_text()?;
                run_demo(matches, margin, 42, &args)
            }
        };
        if let Err(e) = outcome {
            println!("{}: {:#}", "Error".red(), e);
        }
        println!();
    }

    Ok(())
}
