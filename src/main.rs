use facegate::{
    camera::{CameraController, V4l2Source},
    cli::{kiosk, AsciiRenderer, Presenter},
    common::Config,
    core::{submission, ImageBlob, Kiosk, KioskEvents},
    service::{MatchClient, StorageClient},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "facegate")]
#[command(about = "Visitor photo capture and employee authentication client")]
struct Cli {
    /// Enable development mode (verbose logging)
    #[arg(long, global = true)]
    dev: bool,

    /// Config file (default: configs/facegate.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authenticate an image file
    Authenticate {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Capture a photo from the camera and authenticate it
    Capture {
        /// Show the captured frame as ASCII art before submitting
        #[arg(short, long)]
        preview: bool,
    },
    /// Interactive kiosk: camera, file selection and submissions
    Kiosk,
    /// Upload an employee photo to the registration bucket
    Register {
        #[arg(long)]
        first: String,
        #[arg(long)]
        last: String,
        #[arg(short, long)]
        file: PathBuf,
    },
    /// List available cameras
    ListCameras,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    setup_logging(cli.dev);

    match cli.command {
        Commands::ListCameras => list_cameras()?,
        Commands::Authenticate { file } => {
            let config = load_config(cli.config.as_deref())?;
            let presenter = Presenter::new(&config.display);
            let (mut kiosk, mut events) = build_kiosk(&config)?;

            if !kiosk.select_file(&file) {
                abort(&mut kiosk, &presenter);
            }
            let authenticated = submit_and_wait(&mut kiosk, &mut events, &presenter).await;
            exit_with(authenticated);
        }
        Commands::Capture { preview } => {
            let config = load_config(cli.config.as_deref())?;
            let presenter = Presenter::new(&config.display);
            let (mut kiosk, mut events) = build_kiosk(&config)?;

            kiosk.start_camera();
            if !kiosk.camera_active() {
                abort(&mut kiosk, &presenter);
            }

            if preview {
                let renderer = AsciiRenderer::new(config.display.preview_width, config.display.preview_height);
                match kiosk.preview_frame() {
                    Ok(frame) => println!("{}", renderer.render(&frame, Some(" LIVE "))),
                    Err(e) => tracing::warn!("Preview unavailable: {}", e),
                }
            }

            if !kiosk.capture_photo() {
                abort(&mut kiosk, &presenter);
            }
            let authenticated = submit_and_wait(&mut kiosk, &mut events, &presenter).await;
            exit_with(authenticated);
        }
        Commands::Kiosk => {
            let config = load_config(cli.config.as_deref())?;
            let presenter = Presenter::new(&config.display);
            let (kiosk, events) = build_kiosk(&config)?;
            let renderer = AsciiRenderer::new(config.display.preview_width, config.display.preview_height);
            kiosk::run(kiosk, events, presenter, renderer).await?;
        }
        Commands::Register { first, last, file } => {
            let config = load_config(cli.config.as_deref())?;
            register(&config, &first, &last, &file).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    Config::load(path).context("Failed to load configuration")
}

fn build_kiosk(config: &Config) -> Result<(Kiosk<V4l2Source>, KioskEvents)> {
    let camera = CameraController::new(V4l2Source::new(&config.camera), &config.camera);
    let store = Arc::new(StorageClient::new(config)?);
    let matcher = Arc::new(MatchClient::new(config)?);
    Ok(Kiosk::new(camera, store, matcher))
}

/// Submits the pending image and waits for the result; Ctrl-C cancels.
async fn submit_and_wait(
    kiosk: &mut Kiosk<V4l2Source>,
    events: &mut KioskEvents,
    presenter: &Presenter,
) -> bool {
    if kiosk.submit().is_some() {
        presenter.print(kiosk.state());

        while kiosk.state().in_flight.is_some() {
            tokio::select! {
                event = events.next() => match event {
                    Some(event) => kiosk.apply(event),
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    kiosk.cancel();
                }
            }
        }
    }

    kiosk.shutdown();
    presenter.print(kiosk.state());
    kiosk.state().authenticated
}

async fn register(config: &Config, first: &str, last: &str, file: &Path) -> Result<()> {
    let store = StorageClient::registration(config)?;
    let image = ImageBlob::from_file(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let key = submission::register_employee(&store, first, last, &image)
        .await
        .context("Registration upload failed")?;

    println!("✅ Uploaded {} for {} {}", key, first, last);
    println!("   The employee can authenticate once the directory has indexed the photo.");
    Ok(())
}

fn list_cameras() -> Result<()> {
    println!("🔍 Detecting available cameras...\n");

    let cameras = V4l2Source::list_all_cameras()?;
    if cameras.is_empty() {
        println!("❌ No cameras found!");
        println!("\nTroubleshooting:");
        println!("  1. Check if cameras are connected");
        println!("  2. Ensure you have permission to access /dev/video*");
        return Ok(());
    }

    for camera in &cameras {
        println!("📷 /dev/video{}: {}", camera.index, camera.name);
        if !camera.can_capture {
            println!("   - no VIDEO_CAPTURE capability");
        }
        if !camera.formats.is_empty() {
            println!("   - formats: {}", camera.formats.join(", "));
        }
    }

    println!("\n📝 Set the camera in the configuration:");
    println!("   [camera]");
    println!("   device_index = <NUMBER>");
    Ok(())
}

/// Ends a one-shot run before submitting, keeping the failure message on screen.
fn abort(kiosk: &mut Kiosk<V4l2Source>, presenter: &Presenter) -> ! {
    kiosk.shutdown();
    presenter.print(kiosk.state());
    exit_with(false)
}

fn exit_with(authenticated: bool) -> ! {
    std::process::exit(if authenticated { 0 } else { 1 })
}

fn setup_logging(dev_mode: bool) {
    if dev_mode {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_file(true)
            .with_line_number(true)
            .with_thread_ids(true)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }
}
