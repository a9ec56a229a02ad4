//! Fuzzy Car entry point
//!
//! Headless front end: loads a track, drives it with the fuzzy controller and
//! streams the run to the log.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use fuzzy_car::fuzzy::{Defuzzifier, Implication, TConorm, TNorm};
use fuzzy_car::sim::{Runner, SimEvent, Simulation};
use fuzzy_car::{Settings, Track, export, track};

/// Corridor driving with a Mamdani fuzzy controller
#[derive(Parser)]
#[command(name = "fuzzy-car")]
#[command(about = "Drive a car through a corridor with a fuzzy controller", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings JSON file (defaults are used when absent)
    #[arg(long, short, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive one track until goal, collision, sensor failure or step limit
    Run {
        /// Track file, or a directory of tracks together with --name
        #[arg(name = "TRACK")]
        track: PathBuf,

        /// Track name (file stem) when TRACK is a directory
        #[arg(long)]
        name: Option<String>,

        /// Run without pacing
        #[arg(long)]
        headless: bool,

        /// Override the step cap
        #[arg(long)]
        max_steps: Option<u64>,

        #[arg(long)]
        t_norm: Option<TNorm>,

        #[arg(long)]
        t_conorm: Option<TConorm>,

        #[arg(long)]
        implication: Option<Implication>,

        #[arg(long)]
        defuzzifier: Option<Defuzzifier>,

        /// Directory for train4D.txt / train6D.txt
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write the whole run as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Evaluate the controller for one pair of inputs
    Eval {
        /// Front distance
        front: f64,

        /// Left minus right distance
        #[arg(allow_hyphen_values = true)]
        lr_diff: f64,
    },

    /// Print the effective settings, or write them to a file
    Settings {
        #[arg(long)]
        write: Option<PathBuf>,
    },

    /// List the tracks in a directory
    Tracks {
        #[arg(name = "DIR", default_value = "tracks")]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let settings = match &cli.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    match cli.command {
        Commands::Run {
            track,
            name,
            headless,
            max_steps,
            t_norm,
            t_conorm,
            implication,
            defuzzifier,
            export,
            json,
        } => {
            let mut settings = settings;
            if let Some(op) = t_norm {
                settings.operators.t_norm = op;
            }
            if let Some(op) = t_conorm {
                settings.operators.t_conorm = op;
            }
            if let Some(op) = implication {
                settings.operators.implication = op;
            }
            if let Some(op) = defuzzifier {
                settings.operators.defuzzifier = op;
            }
            if max_steps.is_some() {
                settings.max_steps = max_steps;
            }
            if headless {
                settings.fps = 0.0;
            }

            let track = resolve_track(&track, name.as_deref())?;
            run(&settings, &track, export.as_deref(), json.as_deref())
        }
        Commands::Eval { front, lr_diff } => {
            let system = settings.build_fuzzy_system()?;
            let wheel = system.singleton_result(&[front, lr_diff])?;
            println!("{wheel:.4}");
            Ok(())
        }
        Commands::Settings { write } => {
            match write {
                Some(path) => settings.save(&path)?,
                None => println!("{}", serde_json::to_string_pretty(&settings)?),
            }
            Ok(())
        }
        Commands::Tracks { dir } => {
            for (name, track) in track::load_dir(&dir)? {
                println!(
                    "{name}: start ({}, {}) heading {}°, {} wall points",
                    track.start.x,
                    track.start.y,
                    track.heading,
                    track.walls.len()
                );
            }
            Ok(())
        }
    }
}

fn resolve_track(path: &Path, name: Option<&str>) -> Result<Track> {
    if !path.is_dir() {
        return Track::load(path).with_context(|| format!("loading track {}", path.display()));
    }
    let Some(name) = name else {
        bail!("{} is a directory, pick a track with --name", path.display());
    };
    let mut tracks = track::load_dir(path)?;
    tracks
        .remove(name)
        .with_context(|| format!("no track named '{name}' in {}", path.display()))
}

fn run(
    settings: &Settings,
    track: &Track,
    export_dir: Option<&Path>,
    json_path: Option<&Path>,
) -> Result<()> {
    let system = Arc::new(settings.build_fuzzy_system()?);
    let sim = Simulation::from_track(track, settings.car_radius, system)?;

    let mut runner = Runner::from_settings(sim, settings);
    let events = runner.subscribe();
    let handle = runner.spawn();

    // the channel closes when the worker drops the runner
    let mut finished = None;
    for event in events {
        match event {
            SimEvent::Car {
                position,
                heading,
                wheel_angle,
            } => log::debug!(
                "car at ({:.3}, {:.3}) heading {heading:.2}° wheel {wheel_angle:.2}°",
                position.x,
                position.y
            ),
            SimEvent::Radar { readings, .. } => log::debug!("radar {readings}"),
            SimEvent::Console(message) => println!("{message}"),
            SimEvent::Collided | SimEvent::GoalReached => {}
            SimEvent::Finished(result) => finished = Some(result),
        }
    }

    let result = handle.join()?;
    if finished.as_ref() != Some(&result) {
        log::warn!("final event did not match the returned result");
    }

    println!(
        "{} after {} ticks, final position ({:.3}, {:.3})",
        result.phase, result.ticks, result.final_pose.position.x, result.final_pose.position.y
    );

    if let Some(dir) = export_dir {
        let (path_4d, path_6d) = export::save_results(dir, &result.log)
            .with_context(|| format!("exporting to {}", dir.display()))?;
        println!("Saved {} and {}", path_4d.display(), path_6d.display());
    }
    if let Some(path) = json_path {
        export::write_json(path, &result)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}
