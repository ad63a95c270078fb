use std::path::{Path, PathBuf};

use arena_map::ArenaMap;
use clap::{Parser, Subcommand, ValueEnum};
use engine_game::{GameConfig, Scenario, Session};
use tracing::{info, Level};

const EXIT_SUCCESS: i32 = 0;
const EXIT_USAGE: i32 = 2;
const EXIT_CONFIG: i32 = 10;
const EXIT_MAP: i32 = 11;

#[derive(Parser)]
#[command(name = "tools", version, about = "ODM locomotion tools CLI")]
struct Cli {
    /// Log cable attach, release and snap events.
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a scripted scenario headlessly and print the HUD.
    Run(RunArgs),
    /// Parse and validate an arena map file.
    CheckMap {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

#[derive(Parser)]
struct RunArgs {
    #[arg(long, value_enum, default_value = "idle")]
    scenario: ScenarioArg,

    #[arg(long)]
    ticks: Option<u32>,

    /// Frame delta in seconds.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Print the HUD every N frames; 0 prints only the final frame.
    #[arg(long, default_value_t = 0)]
    hud_every: u32,

    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Defaults to the built-in city.
    #[arg(long, value_name = "PATH")]
    map: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy)]
enum ScenarioArg {
    Idle,
    Walk,
    Jump,
    GrappleReel,
    Snap,
}

impl From<ScenarioArg> for Scenario {
    fn from(arg: ScenarioArg) -> Self {
        match arg {
            ScenarioArg::Idle => Scenario::Idle,
            ScenarioArg::Walk => Scenario::Walk,
            ScenarioArg::Jump => Scenario::Jump,
            ScenarioArg::GrappleReel => Scenario::GrappleReel,
            ScenarioArg::Snap => Scenario::Snap,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .init();

    let exit_code = match cli.command {
        Commands::Run(args) => run_scenario(args),
        Commands::CheckMap { path } => check_map(&path),
    };
    std::process::exit(exit_code);
}

fn run_scenario(args: RunArgs) -> i32 {
    if !args.dt.is_finite() || args.dt <= 0.0 {
        eprintln!("--dt must be > 0");
        return EXIT_USAGE;
    }
    let config = match &args.config {
        Some(path) => match GameConfig::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("config {}: {}", path.display(), err);
                return EXIT_CONFIG;
            }
        },
        None => GameConfig::default(),
    };
    let map = match &args.map {
        Some(path) => match ArenaMap::load(path) {
            Ok(map) => map,
            Err(err) => {
                eprintln!("map {}: {}", path.display(), err);
                return EXIT_MAP;
            }
        },
        None => ArenaMap::city(),
    };

    let scenario = Scenario::from(args.scenario);
    let ticks = args.ticks.unwrap_or_else(|| scenario.default_ticks());
    info!(scenario = scenario.name(), ticks, "running scenario");

    let mut session = Session::new(config, &map);
    let mut fired = 0;
    let mut snapped = 0;
    let mut obstructed = 0;
    for tick in 0..ticks {
        let report = session.frame(args.dt, &scenario.input(tick));
        fired += report.fired.iter().filter(|(_, hit)| *hit).count();
        snapped += report
            .player
            .is_some_and(|frame| frame.snapped.is_some()) as usize;
        obstructed += report.obstructed.any() as usize;
        if args.hud_every > 0 && tick % args.hud_every == 0 {
            println!("[{:>5}] {}", tick, session.hud());
        }
    }

    println!(
        "scenario {} ok (ticks={}, elapsed={:.2}s, hooks={}, snaps={}, obstructions={})",
        scenario.name(),
        ticks,
        session.elapsed(),
        fired,
        snapped,
        obstructed
    );
    println!("{}", session.hud());
    EXIT_SUCCESS
}

fn check_map(path: &Path) -> i32 {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            eprintln!("map read failed: {}", err);
            return EXIT_MAP;
        }
    };
    let map = match ArenaMap::parse_toml(&text) {
        Ok(map) => map,
        Err(err) => {
            eprintln!("map parse failed: {}", err);
            return EXIT_MAP;
        }
    };
    let validation = map.validate();
    for warning in &validation.warnings {
        println!("warning: {}", warning);
    }
    if !validation.is_ok() {
        for error in &validation.errors {
            eprintln!("error: {}", error);
        }
        return EXIT_MAP;
    }
    let grappleable = map
        .buildings
        .iter()
        .filter(|building| building.grappleable)
        .count();
    println!(
        "map {} ok (buildings={}, grappleable={}, floor={})",
        map.name,
        map.buildings.len(),
        grappleable,
        map.floor
    );
    EXIT_SUCCESS
}
