use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use rollcall_engine::{
    Collector, Config, PreviewSink, RecognitionOutcome, RecognitionSession, StopFlag, Trainer,
};
use rollcall_hw::Camera;
use rollcall_store::{AttendanceRecorder as _, SubjectRegistry as _};

#[derive(Parser)]
#[command(name = "rollcall", about = "Face-recognition attendance from the command line")]
struct Cli {
    /// TOML configuration file (overrides ROLLCALL_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture face samples for a subject (type q + Enter to stop early)
    Collect {
        /// Subject identifier (no '_', '/', '\' or whitespace)
        #[arg(short, long)]
        id: String,
        /// Display name
        #[arg(short, long)]
        name: String,
    },
    /// Rebuild the known-face encodings from the collected samples
    Train,
    /// Recognise faces and record attendance (type q + Enter to quit)
    Recognize {
        /// Stop after the first recognised face
        #[arg(long)]
        once: bool,
    },
    /// List recorded attendance
    Attendance {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// List V4L2 capture devices
    Devices,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Collect { id, name } => collect(&config, &id, &name),
        Commands::Train => train(&config),
        Commands::Recognize { once } => recognize(&config, once),
        Commands::Attendance { json } => attendance(&config, json),
        Commands::Devices => {
            devices();
            Ok(())
        }
    }
}

/// Set the stop flag when the operator types `q` on stdin.
fn watch_for_quit() -> StopFlag {
    let stop = StopFlag::new();
    let flag = stop.clone();
    let spawned = std::thread::Builder::new()
        .name("rollcall-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                match line {
                    Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                        flag.stop();
                        break;
                    }
                    Ok(_) => {}
                    Err(_) => break,
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "cannot watch stdin; q will not stop the loop");
    }
    stop
}

fn collect(config: &Config, id: &str, name: &str) -> Result<()> {
    rollcall_engine::validate_subject_id(id)?;
    let stores = config.open_stores()?;
    let (_, created) = stores.subjects.upsert_subject(id, name)?;
    if created {
        println!("Enrolled new subject {name} (ID: {id})");
    }

    let mut camera = config.open_camera().context("camera access failed")?;
    let mut analyzer = config.load_analyzer().context("failed to load face models")?;
    println!("Collecting up to {} images; type q + Enter to stop", config.samples_per_subject);

    let report = Collector::from_config(config).run(id, name, &mut camera, &mut analyzer, &watch_for_quit())?;
    println!(
        "Collected {} images for {name} (ID: {id}) [{:?}]",
        report.saved.len(),
        report.ended
    );
    Ok(())
}

fn train(config: &Config) -> Result<()> {
    let mut analyzer = config.load_analyzer().context("failed to load face models")?;
    let (_, report) = Trainer::from_config(config).run(&mut analyzer)?;
    println!(
        "Model training completed: {} encoded, {} without a face, {} unreadable -> {}",
        report.encoded,
        report.skipped_no_face,
        report.skipped_unreadable,
        config.encodings_path.display()
    );
    Ok(())
}

fn recognize(config: &Config, once: bool) -> Result<()> {
    let stores = config.open_stores()?;
    let session = RecognitionSession::load(&config.encodings_path, stores.recorder.as_ref())?;
    let mut camera = config.open_camera().context("camera access failed")?;
    let mut analyzer = config.load_analyzer().context("failed to load face models")?;
    let stop = watch_for_quit();

    if once {
        let outcome = session.run_once(&mut camera, &mut analyzer, &stop)?;
        println!("{}: {}", outcome.status(), outcome.message());
        if let RecognitionOutcome::NoMatch { ended } = outcome {
            tracing::debug!(?ended, "no match");
        }
        return Ok(());
    }

    println!(
        "Recognising; preview at {}. Type q + Enter to quit",
        config.preview_path.display()
    );
    let mut sink = PreviewSink::from_config(config);
    let summary = session.run_interactive(&mut camera, &mut analyzer, &mut sink, &stop)?;
    for (label, outcome) in &summary.marked {
        println!("{label}: {outcome:?}");
    }
    println!("{} frames processed, {} subjects recognised", summary.frames, summary.marked.len());
    Ok(())
}

fn attendance(config: &Config, json: bool) -> Result<()> {
    let entries = config.open_stores()?.recorder.list()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No attendance recorded");
        return Ok(());
    }
    println!("{:<12} {:<24} {:<10} {}", "DATE", "NAME", "ID", "TIME");
    for e in entries {
        println!("{:<12} {:<24} {:<10} {}", e.date, e.name, e.subject_id, e.time);
    }
    Ok(())
}

fn devices() {
    let devices = Camera::list_devices();
    if devices.is_empty() {
        println!("No V4L2 capture devices found");
        return;
    }
    for d in devices {
        println!("{}  {} (driver {}, bus {})", d.path, d.name, d.driver, d.bus);
    }
}
