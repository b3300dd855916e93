use clap::{Parser, Subcommand};
use std::{
    error::Error,
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
};
use tracing_subscriber::EnvFilter;
use waymark::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    controller::{ActivityController, AppEvent, Feedback, FixedLocation, MarkerSink, NewWorkoutRequest},
    persistence::PersistenceAdapter,
    render::{render_list, render_workout, ConsoleMarkers},
    storage::{KeyValueStore, SqliteKeyValueStore},
    workout::{Coordinates, WorkoutKind},
};

/// log runs and rides against map coordinates
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Record running and cycling workouts at map positions. Pace and speed are derived once when a workout is entered and the whole history is kept across restarts."
)]
pub struct Cli {
    /// database file holding the workout history
    #[clap(long, global = true)]
    db: Option<PathBuf>,

    /// config file to read instead of the platform default
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// log debug output to stderr
    #[clap(short = 'v', long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
    /// record a workout at a map position
    Add {
        /// running or cycling
        #[clap(short = 't', long = "type", default_value = "running")]
        kind: String,

        /// latitude of the map point
        #[clap(long, allow_hyphen_values = true, value_parser = parse_coordinate)]
        lat: f64,

        /// longitude of the map point
        #[clap(long, allow_hyphen_values = true, value_parser = parse_coordinate)]
        lng: f64,

        /// distance in km
        #[clap(short = 'd', long, default_value = "", allow_hyphen_values = true)]
        distance: String,

        /// duration in minutes
        #[clap(short = 'm', long, default_value = "", allow_hyphen_values = true)]
        duration: String,

        /// steps per minute (running)
        #[clap(short = 'c', long, allow_hyphen_values = true)]
        cadence: Option<String>,

        /// elevation gain in metres (cycling)
        #[clap(short = 'e', long, allow_hyphen_values = true)]
        elevation: Option<String>,
    },
    /// show every workout, newest first, after placing their markers
    List,
    /// pan to a workout by id
    Show { id: String },
    /// delete the whole workout history
    Reset,
}

fn parse_coordinate(raw: &str) -> Result<f64, String> {
    let value: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("{raw} is not a map coordinate"))
    }
}

impl Command {
    fn to_event(&self) -> Option<AppEvent> {
        match self {
            Command::Add {
                kind,
                lat,
                lng,
                distance,
                duration,
                cadence,
                elevation,
            } => {
                let extra = match WorkoutKind::parse(kind) {
                    Some(WorkoutKind::Cycling) => elevation,
                    _ => cadence,
                };
                Some(AppEvent::NewWorkout(NewWorkoutRequest {
                    kind: kind.clone(),
                    coordinates: Coordinates::new(*lat, *lng),
                    distance: distance.clone(),
                    duration: duration.clone(),
                    cadence_or_elevation: extra.clone().unwrap_or_default(),
                }))
            }
            Command::Show { id } => Some(AppEvent::Select(id.clone())),
            Command::Reset => Some(AppEvent::Reset),
            Command::List => None,
        }
    }

    fn shows_markers(&self) -> bool {
        matches!(self, Command::Add { .. } | Command::List)
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("warn,waymark=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config_store = cli
        .config
        .as_ref()
        .map(FileConfigStore::with_path)
        .unwrap_or_default();
    tracing::debug!(path = %config_store.path().display(), "loading config");
    let config = config_store.load();

    let db_path = AppDirs::resolve_db_path(cli.db.clone(), &config);
    tracing::debug!(path = %db_path.display(), "opening workout database");
    let substrate = SqliteKeyValueStore::open(&db_path)?;
    let persistence = PersistenceAdapter::with_key(substrate, config.storage_key.clone());

    let out: Box<dyn Write> = if cli.command.shows_markers() {
        Box::new(io::stdout())
    } else {
        Box::new(io::sink())
    };
    let mut controller =
        ActivityController::start(persistence, ConsoleMarkers::new(out), config.map_zoom);

    Ok(run(&mut controller, &cli.command, &config))
}

fn run<S: KeyValueStore, M: MarkerSink>(
    controller: &mut ActivityController<S, M>,
    command: &Command,
    config: &Config,
) -> ExitCode {
    let Some(event) = command.to_event() else {
        match controller.locate(&FixedLocation(config.home)) {
            Some(view) => println!(
                "Map centred on {:.4}, {:.4} (zoom {})",
                view.center.lat, view.center.lng, view.zoom
            ),
            None => eprintln!("Could not get your position"),
        }
        println!("{}", render_list(controller.store().all()));
        return ExitCode::SUCCESS;
    };

    match controller.handle(event) {
        Feedback::Created { id } => {
            if let Some(workout) = controller.store().find_by_id(&id) {
                println!("{}", render_workout(workout));
            }
            ExitCode::SUCCESS
        }
        Feedback::CreatedUnsaved { id, message } => {
            if let Some(workout) = controller.store().find_by_id(&id) {
                println!("{}", render_workout(workout));
            }
            eprintln!("Workout was not saved: {message}");
            ExitCode::FAILURE
        }
        Feedback::Rejected { message } => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
        Feedback::PanTo(view) => {
            println!(
                "{:.4}, {:.4} (zoom {})",
                view.center.lat, view.center.lng, view.zoom
            );
            ExitCode::SUCCESS
        }
        Feedback::Ignored => ExitCode::SUCCESS,
        Feedback::Cleared => {
            println!("Workout history cleared.");
            ExitCode::SUCCESS
        }
    }
}
