//! SkyQueue Headless Simulation Harness
//!
//! Validates the scoring logic, weather generation and queue rules, then
//! plays a whole scripted week with a simple planner. No renderer; the
//! leaderboard is in-memory unless `--leaderboard` points at a service.
//!
//! Usage:
//!   cargo run -p skyqueue-simtest
//!   cargo run -p skyqueue-simtest -- --verbose --seed 7
//!   cargo run -p skyqueue-simtest -- --leaderboard http://localhost:3000 --name Ana

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skyqueue_core::catalog::{Catalog, CatalogState, Observation};
use skyqueue_core::config::SimConfig;
use skyqueue_core::engine::SimulationEngine;
use skyqueue_core::leaderboard::{HttpLeaderboard, InMemoryLeaderboard, LeaderboardClient};
use skyqueue_core::queue::{NightlyQueue, QueueRejection};
use skyqueue_core::weather::{generate_night_forecast, generate_weekly_forecast};
use skyqueue_logic::constants::{night, MAX_QUEUE_SIZE, NIGHTS_PER_WEEK};
use skyqueue_logic::scoring::{self, ScoreClass};
use skyqueue_logic::tiers::{CcTier, IqTier, Requirements, WvTier};
use skyqueue_logic::weather::{DailyForecast, WeatherState};
use std::collections::HashSet;
use std::path::PathBuf;

/// Simulated minutes the planner will fill per night.
const PLANNER_NIGHT_BUDGET: u32 = 40;

#[derive(Parser, Debug)]
#[command(name = "skyqueue-simtest")]
#[command(about = "Headless validation and scripted week for the SkyQueue engine")]
struct Args {
    /// RNG seed for forecasts
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Print every check, not just failures
    #[arg(short, long)]
    verbose: bool,

    /// Timing configuration JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Catalog JSON (defaults to the bundled catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Leaderboard base URL; submissions stay in memory when omitted
    #[arg(long)]
    leaderboard: Option<String>,

    /// Name to submit the week under
    #[arg(long, default_value = "simtest")]
    name: String,

    /// Write the week summary JSON here
    #[arg(long)]
    export: Option<PathBuf>,

    /// Tick size for the scripted week, real milliseconds
    #[arg(long, default_value_t = 16.0)]
    step_ms: f64,
}

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if args.verbose {
        "debug"
    } else {
        "warn"
    }))
    .init();

    println!("=== SkyQueue Simulation Harness ===\n");

    let config = match &args.config {
        Some(path) => match SimConfig::from_path(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Failed to load config {}: {}", path.display(), e);
                std::process::exit(2);
            }
        },
        None => SimConfig::default(),
    };
    let catalog = match &args.catalog {
        Some(path) => Catalog::from_path(path),
        None => Catalog::builtin(),
    };
    let catalog = match catalog {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load catalog: {}", e);
            std::process::exit(2);
        }
    };

    let mut results = Vec::new();

    // 1. Catalog
    results.extend(validate_catalog(&catalog));

    // 2. Scoring curves
    results.extend(validate_scoring());

    // 3. Weather generation
    results.extend(validate_weather(args.seed));

    // 4. Queue rules
    results.extend(validate_queue(&catalog));

    // 5. Scripted week
    results.extend(run_scripted_week(&args, &catalog, &config));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || args.verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Catalog ──────────────────────────────────────────────────────────

fn validate_catalog(catalog: &Catalog) -> Vec<TestResult> {
    println!("--- Catalog ---");
    let mut results = Vec::new();

    results.push(check(
        "catalog_not_empty",
        !catalog.is_empty(),
        format!("{} targets", catalog.len()),
    ));

    let ids: HashSet<u32> = catalog.observations().iter().map(|o| o.id).collect();
    results.push(check(
        "catalog_unique_ids",
        ids.len() == catalog.len(),
        format!("{} unique ids", ids.len()),
    ));

    let bad_coords: Vec<&str> = catalog
        .observations()
        .iter()
        .filter(|o| {
            let p = o.pointing();
            p.ra_hours == 0.0 && p.dec_degrees == 0.0
        })
        .map(|o| o.name.as_str())
        .collect();
    results.push(check(
        "catalog_coordinates_parse",
        bad_coords.is_empty(),
        if bad_coords.is_empty() {
            "all coordinates parse".to_string()
        } else {
            format!("unparsed: {:?}", bad_coords)
        },
    ));

    let oversized: Vec<&str> = catalog
        .observations()
        .iter()
        .filter(|o| o.duration > 60)
        .map(|o| o.name.as_str())
        .collect();
    results.push(check(
        "catalog_durations_fit_night",
        oversized.is_empty(),
        format!("{} targets over an hour", oversized.len()),
    ));

    println!(
        "  {} targets, {} max base points",
        catalog.len(),
        catalog.max_possible_score()
    );
    results
}

// ── 2. Scoring ──────────────────────────────────────────────────────────

fn validate_scoring() -> Vec<TestResult> {
    println!("--- Scoring ---");
    let mut results = Vec::new();

    let reference = scoring::score(
        &Requirements::new(IqTier::IqAny, CcTier::CcAny, WvTier::WvAny),
        &WeatherState::new(20.0, 0.8, 45.0),
    );
    results.push(check(
        "score_reference_case",
        reference.base_points == 23 && reference.points == 34 && reference.efficiency == 148,
        format!(
            "base {} points {} efficiency {}",
            reference.base_points, reference.points, reference.efficiency
        ),
    ));

    let boundary = scoring::score(
        &Requirements::new(IqTier::Iq20, CcTier::CcAny, WvTier::WvAny),
        &WeatherState::new(100.0, 0.4, 100.0),
    );
    results.push(check(
        "score_iq_boundary",
        boundary.iq_factor == 1.0,
        format!("IQ20 at 0.4\" -> {}", boundary.iq_factor),
    ));

    // Sweep the whole in-range grid for floor violations
    let mut min_iq = f64::MAX;
    let mut min_cc = f64::MAX;
    let mut min_wv = f64::MAX;
    for iq in IqTier::all() {
        for cc in CcTier::all() {
            for wv in WvTier::all() {
                let req = Requirements::new(iq, cc, wv);
                for clouds in (0..=100).step_by(5) {
                    for seeing_tenths in 2..=30 {
                        for humidity in (0..=100).step_by(5) {
                            let weather = WeatherState::new(
                                clouds as f64,
                                seeing_tenths as f64 / 10.0,
                                humidity as f64,
                            );
                            let s = scoring::score(&req, &weather);
                            min_iq = min_iq.min(s.iq_factor);
                            min_cc = min_cc.min(s.cc_factor);
                            min_wv = min_wv.min(s.wv_factor);
                        }
                    }
                }
            }
        }
    }
    results.push(check(
        "score_factor_floors",
        min_iq >= 0.3 - 1e-12 && min_cc >= 0.3 - 1e-12 && min_wv >= 0.5 - 1e-12,
        format!("min IQ {:.3}, CC {:.3}, WV {:.3}", min_iq, min_cc, min_wv),
    ));

    results.push(check(
        "score_classes",
        ScoreClass::from_efficiency(80) == ScoreClass::Good
            && ScoreClass::from_efficiency(79) == ScoreClass::Ok
            && ScoreClass::from_efficiency(49) == ScoreClass::Poor,
        "80/50 bands",
    ));

    results
}

// ── 3. Weather ──────────────────────────────────────────────────────────

fn validate_weather(seed: u64) -> Vec<TestResult> {
    println!("--- Weather ---");
    let mut results = Vec::new();

    let week_a = generate_weekly_forecast(&mut ChaCha8Rng::seed_from_u64(seed));
    let week_b = generate_weekly_forecast(&mut ChaCha8Rng::seed_from_u64(seed));
    results.push(check(
        "weather_seeded_determinism",
        week_a == week_b,
        format!("seed {}", seed),
    ));
    results.push(check(
        "weather_week_length",
        week_a.len() == NIGHTS_PER_WEEK,
        format!("{} nights", week_a.len()),
    ));

    let ceilings_ok = week_a
        .iter()
        .all(|d| d.avg_clouds <= 95.0 && d.avg_humidity <= 90.0);
    results.push(check(
        "weather_daily_ceilings",
        ceilings_ok,
        "clouds <= 95, humidity <= 90",
    ));

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut blocks_ok = true;
    let mut block_count_ok = true;
    for day in &week_a {
        let blocks = generate_night_forecast(&mut rng, day);
        block_count_ok &= blocks.len() == night::FORECAST_BLOCKS;
        blocks_ok &= blocks.iter().all(|b| {
            (0.0..=100.0).contains(&b.clouds)
                && b.seeing >= 0.2
                && (10.0..=95.0).contains(&b.humidity)
        });
    }
    results.push(check(
        "weather_block_count",
        block_count_ok,
        format!("{} blocks per night", night::FORECAST_BLOCKS),
    ));
    results.push(check("weather_block_clamps", blocks_ok, "all blocks in range"));

    for day in &week_a {
        println!(
            "  {:<9} {:<13} clouds {:>5.1}%  seeing {:.2}\"  humidity {:>4.1}%",
            day.day_name,
            day.condition.label(),
            day.avg_clouds,
            day.avg_seeing,
            day.avg_humidity
        );
    }
    results
}

// ── 4. Queue ────────────────────────────────────────────────────────────

fn validate_queue(catalog: &Catalog) -> Vec<TestResult> {
    println!("--- Queue ---");
    let mut results = Vec::new();
    let available = CatalogState::from_catalog(catalog);
    let ids: Vec<u32> = catalog.observations().iter().map(|o| o.id).collect();

    let mut queue = NightlyQueue::new();
    let first = ids.first().copied().unwrap_or_default();
    let once = queue.try_add(first, &available).is_ok();
    let twice = queue.try_add(first, &available);
    results.push(check(
        "queue_add_idempotent",
        once && twice == Err(QueueRejection::AlreadyQueued) && queue.len() == 1,
        format!("second add -> {:?}", twice),
    ));

    for &id in ids.iter().skip(1) {
        if queue.is_full() {
            break;
        }
        let _ = queue.try_add(id, &available);
    }
    let overflow = ids
        .get(MAX_QUEUE_SIZE)
        .map(|&id| queue.try_add(id, &available));
    results.push(check(
        "queue_capacity",
        queue.len() == MAX_QUEUE_SIZE.min(ids.len())
            && overflow.map_or(true, |r| r == Err(QueueRejection::Full)),
        format!("{} queued, overflow -> {:?}", queue.len(), overflow),
    ));

    queue.lock();
    let locked = queue.try_clear();
    results.push(check(
        "queue_locked_while_running",
        locked == Err(QueueRejection::Locked) && !queue.is_empty(),
        format!("clear while locked -> {:?}", locked),
    ));

    results
}

// ── 5. Scripted week ────────────────────────────────────────────────────

/// Greedy plan: targets whose requirements tonight's average sky meets best,
/// strictest first, within the night's minute budget.
fn plan_night(available: &CatalogState, daily: &DailyForecast) -> Vec<Observation> {
    let expected = WeatherState::new(daily.avg_clouds, daily.avg_seeing, daily.avg_humidity);
    let mut candidates: Vec<(&Observation, u32)> = available
        .iter()
        .map(|o| (o, o.score(&expected).points))
        .collect();
    candidates.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.id.cmp(&b.0.id)));

    let mut minutes = 0;
    let mut plan = Vec::new();
    for (obs, _) in candidates {
        if plan.len() >= MAX_QUEUE_SIZE {
            break;
        }
        if minutes + obs.duration <= PLANNER_NIGHT_BUDGET {
            minutes += obs.duration;
            plan.push(obs.clone());
        }
    }
    plan
}

fn run_scripted_week(args: &Args, catalog: &Catalog, config: &SimConfig) -> Vec<TestResult> {
    println!("--- Scripted Week ---");
    let mut results = Vec::new();
    let mut engine = SimulationEngine::new(catalog.clone(), config.clone(), args.seed);
    let mut seen_completed: HashSet<u32> = HashSet::new();
    let mut depletion_ok = true;
    let mut save_ok = true;

    for night_index in 0..NIGHTS_PER_WEEK {
        let week = engine.week();
        let Some(daily) = week.weekly_forecast().get(night_index).cloned() else {
            break;
        };
        let plan = plan_night(week.available(), &daily);

        for obs in &plan {
            engine.add_to_queue(obs.id);
        }
        if engine.start_night() {
            // Save mid-night once to check the restore lands in planning
            if night_index == 0 {
                engine.tick(config.slew_duration_ms + 1.0);
                save_ok = check_mid_night_save(&engine, night_index);
            }
            engine.run_night(args.step_ms);
        } else {
            engine.end_night();
        }

        let week = engine.week();
        if let Some(result) = week.results().last() {
            for c in &result.completed {
                depletion_ok &= seen_completed.insert(c.observation.id);
                depletion_ok &= !week.available().contains(c.observation.id);
                if args.verbose {
                    println!(
                        "    {:<32} +{:>3} ({:>3}% {:?})",
                        c.observation.name,
                        c.score.points,
                        c.score.efficiency,
                        ScoreClass::from_efficiency(c.score.efficiency)
                    );
                }
            }
            println!(
                "  Night {} {:<9} {:<13} {} targets, {:>4} points, {:>3}% efficiency",
                result.night,
                result.day_name,
                daily.condition.label(),
                result.completed.len(),
                result.score,
                result.efficiency
            );
        }
    }

    let week = engine.week();
    results.push(check(
        "week_completes",
        week.is_week_complete(),
        format!("{} nights recorded", week.results().len()),
    ));

    let night_total: u32 = week.results().iter().map(|r| r.score).sum();
    results.push(check(
        "week_score_conservation",
        night_total == week.weekly_score(),
        format!("nights {} vs weekly {}", night_total, week.weekly_score()),
    ));
    results.push(check(
        "week_catalog_depletion",
        depletion_ok && week.available().len() + seen_completed.len() == catalog.len(),
        format!(
            "{} completed, {} still available",
            seen_completed.len(),
            week.available().len()
        ),
    ));
    results.push(check(
        "week_mid_night_save",
        save_ok,
        "restored save is in planning with the night discarded",
    ));

    let Some(summary) = engine.summary().cloned() else {
        results.push(check("week_summary", false, "no summary after seven nights"));
        return results;
    };
    println!(
        "  Week: {} points of {} possible, {}% efficiency, {}% complete - {}",
        summary.weekly_score,
        summary.max_possible_score,
        summary.weekly_efficiency,
        summary.completion_rate,
        summary.rating.label()
    );
    if args.verbose {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => log::warn!("Could not render summary: {}", e),
        }
    }

    if let Some(path) = &args.export {
        let exported = std::fs::File::create(path)
            .map_err(skyqueue_core::error::SaveError::from)
            .and_then(|file| engine.export_summary(file));
        results.push(check(
            "week_export",
            exported.is_ok(),
            match exported {
                Ok(()) => format!("wrote {}", path.display()),
                Err(e) => e.to_string(),
            },
        ));
    }

    results.push(submit(args, &engine));
    results
}

fn check_mid_night_save(engine: &SimulationEngine, night_index: usize) -> bool {
    let mut buffer = Vec::new();
    if let Err(e) = engine.save(&mut buffer) {
        log::warn!("Save failed: {}", e);
        return false;
    }
    let mut restored =
        SimulationEngine::new(engine.week().catalog().clone(), SimConfig::default(), 0);
    if let Err(e) = restored.load(&buffer[..]) {
        log::warn!("Load failed: {}", e);
        return false;
    }
    let snap = restored.snapshot();
    !snap.is_running
        && snap.queue.is_empty()
        && snap.night_index == night_index
        && snap.clock == "19:00:00"
}

fn submit(args: &Args, engine: &SimulationEngine) -> TestResult {
    let outcome = match &args.leaderboard {
        Some(url) => HttpLeaderboard::new(url).and_then(|client| {
            let receipt = engine.submit_week(&client, &args.name)?;
            let top = client.top_scores()?;
            Ok((receipt, top.len()))
        }),
        None => {
            let client = InMemoryLeaderboard::new();
            engine
                .submit_week(&client, &args.name)
                .and_then(|receipt| Ok((receipt, client.top_scores()?.len())))
        }
    };
    match outcome {
        Ok((receipt, listed)) => check(
            "leaderboard_submit",
            receipt.rank >= 1,
            format!("rank {} of {} listed", receipt.rank, listed),
        ),
        Err(e) => check("leaderboard_submit", false, e.to_string()),
    }
}
