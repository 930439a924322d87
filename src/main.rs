// ABOUTME: Main entry point for the clickcast editor.
// ABOUTME: Provides the CLI interface and executes commands from the library.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clickcast::drivers::{
    self, CommandScreenDriver, FixedMouse, ImageFileScreenDriver, NullKeyboard, ScreenDriver,
};
use clickcast::{BuildConfig, CaptureState, Editor, KeyOutcome, SettingsStore};
use std::env;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty project
    New(NewArgs),

    /// Show the slides of a project
    Info(ProjectArgs),

    /// Capture mode: read key names from stdin, one per line
    Capture(CaptureArgs),

    /// Remove a slide (and its image if no other slide uses it)
    RemoveSlide(SlideArgs),

    /// Move a slide one step up or down
    MoveSlide(MoveArgs),

    /// Move the mouse cursor of an action
    SetMouse(SetMouseArgs),

    /// Set the output image size (0 keeps the screenshot aspect ratio)
    SetSize(SetSizeArgs),

    /// Generate the playback bundle into <dir>/build
    Generate(ProjectArgs),

    /// Remove the build directory
    Clean(ProjectArgs),

    /// Delete screenshots no slide uses anymore
    Prune(ProjectArgs),

    /// Serve the generated bundle over HTTP
    Preview(PreviewArgs),

    /// Show or change the user settings
    Settings(SettingsArgs),
}

#[derive(Args)]
struct ProjectArgs {
    /// Project directory
    dir: PathBuf,
}

#[derive(Args)]
struct NewArgs {
    /// Project directory
    dir: PathBuf,

    /// Output width (defaults to the user setting)
    #[arg(long)]
    width: Option<u32>,

    /// Output height (defaults to the user setting)
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Args)]
struct CaptureArgs {
    /// Project directory (created when it holds no project yet)
    dir: PathBuf,

    /// Screenshot command, `{path}` is replaced by the target file
    #[arg(long, conflicts_with = "image")]
    command: Option<String>,

    /// Use a copy of this image instead of a live screenshot
    #[arg(long)]
    image: Option<PathBuf>,

    /// Pointer position to record, as normalised "x,y"
    #[arg(long, value_parser = parse_point, default_value = "0.5,0.5")]
    cursor: (f64, f64),
}

#[derive(Args)]
struct SlideArgs {
    /// Project directory
    dir: PathBuf,

    /// Slide index, starting at 0
    index: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Direction {
    Up,
    Down,
}

#[derive(Args)]
struct MoveArgs {
    /// Project directory
    dir: PathBuf,

    /// Slide index, starting at 0
    index: usize,

    #[arg(value_enum)]
    direction: Direction,
}

#[derive(Args)]
struct SetMouseArgs {
    /// Project directory
    dir: PathBuf,

    slide: usize,

    action: usize,

    x: f64,

    y: f64,
}

#[derive(Args)]
struct SetSizeArgs {
    /// Project directory
    dir: PathBuf,

    width: u32,

    height: u32,
}

#[derive(Args)]
struct PreviewArgs {
    /// Project directory
    dir: PathBuf,

    #[arg(long, default_value_t = 8080)]
    port: u16,
}

#[derive(Args)]
struct SettingsArgs {
    #[arg(long)]
    capture_key: Option<String>,

    #[arg(long)]
    default_width: Option<u32>,

    #[arg(long)]
    default_height: Option<u32>,

    #[arg(long)]
    default_speed: Option<f64>,
}

fn parse_point(s: &str) -> Result<(f64, f64), String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got {}", s))?;
    let x = x.trim().parse::<f64>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f64>().map_err(|e| e.to_string())?;
    Ok((x, y))
}

/// Where screenshots come from.
enum ScreenSource {
    Command(String),
    Image(PathBuf),
}

impl ScreenSource {
    fn from_env() -> Self {
        let template = env::var("CLICKCAST_SCREENSHOT_CMD")
            .unwrap_or_else(|_| "scrot --overwrite {path}".to_string());
        ScreenSource::Command(template)
    }
}

fn build_editor(source: ScreenSource, cursor: (f64, f64)) -> anyhow::Result<Editor> {
    let settings = SettingsStore::from_env().context("Failed to load settings")?;
    let screen: Box<dyn ScreenDriver> = match source {
        ScreenSource::Command(template) => Box::new(CommandScreenDriver::new(template)),
        ScreenSource::Image(path) => Box::new(ImageFileScreenDriver::new(path)),
    };
    Ok(Editor::new(
        settings,
        BuildConfig::from_env(),
        screen,
        Box::new(FixedMouse::new(cursor.0, cursor.1)),
        Box::new(NullKeyboard::default()),
    ))
}

fn open_editor(dir: &Path) -> anyhow::Result<Editor> {
    let mut editor = build_editor(ScreenSource::from_env(), (0.5, 0.5))?;
    editor.open_project(dir)?;
    Ok(editor)
}

fn print_info(editor: &Editor) {
    let Some(session) = editor.session() else {
        return;
    };
    let p = session.presentation();
    println!("Project: {:?}", session.project_dir());
    println!("Output size: {}x{}", p.output_width, p.output_height);
    println!("{} slides", p.slides.len());
    for (i, slide) in p.slides.iter().enumerate() {
        println!("  [{}] {} {}", i, slide.id, slide.image_path);
        for (j, action) in slide.actions.iter().enumerate() {
            println!(
                "      ({}) {} -> {}, {} at speed {}",
                j, action.target, action.final_abs, action.final_ord, action.speed
            );
        }
    }
}

fn run_new(args: &NewArgs) -> anyhow::Result<()> {
    let mut editor = build_editor(ScreenSource::from_env(), (0.5, 0.5))?;
    editor.new_project(&args.dir)?;
    if args.width.is_some() || args.height.is_some() {
        let defaults = editor.settings().settings().clone();
        editor.set_output_size(
            args.width.unwrap_or(defaults.default_width),
            args.height.unwrap_or(defaults.default_height),
        )?;
    }
    editor.save()?;
    println!("New project created in {:?}", args.dir);
    Ok(())
}

fn run_capture(args: &CaptureArgs) -> anyhow::Result<()> {
    let source = match (&args.image, &args.command) {
        (Some(image), _) => ScreenSource::Image(image.clone()),
        (None, Some(command)) => ScreenSource::Command(command.clone()),
        (None, None) => ScreenSource::from_env(),
    };
    let mut editor = build_editor(source, args.cursor)?;
    editor.open_or_create(&args.dir)?;
    editor.toggle_capture_mode()?;

    println!(
        "Capture mode ON ({} to take a screenshot / ESC to exit capture mode)",
        editor.settings().capture_key().to_uppercase()
    );

    // A failed key only loses that capture; earlier slides are still saved.
    let mut input_error = None;
    for key in drivers::read_key_events(io::stdin().lock()) {
        let key = match key {
            Ok(key) => key,
            Err(e) => {
                input_error = Some(e);
                break;
            }
        };
        match editor.handle_key(&key) {
            Ok(KeyOutcome::Captured { index, id }) => {
                println!("Slide {} captured ({})", index, id)
            }
            Ok(KeyOutcome::Stopped) => break,
            Ok(KeyOutcome::Ignored) => {}
            Err(e) => eprintln!("Capture failed: {}", e),
        }
    }
    if editor.capture_state() == CaptureState::Capturing {
        editor.toggle_capture_mode()?;
    }
    println!("Capture mode OFF");

    editor.save()?;
    match input_error {
        Some(e) => Err(e).context("Failed to read key events"),
        None => Ok(()),
    }
}

fn run_remove_slide(args: &SlideArgs) -> anyhow::Result<()> {
    let mut editor = open_editor(&args.dir)?;
    editor.select_slide(args.index)?;
    editor.remove_selected_slide()?;
    editor.save()?;
    println!("Slide {} removed", args.index);
    Ok(())
}

fn run_move_slide(args: &MoveArgs) -> anyhow::Result<()> {
    let mut editor = open_editor(&args.dir)?;
    editor.select_slide(args.index)?;
    let moved = match args.direction {
        Direction::Up => editor.move_selected_up()?,
        Direction::Down => editor.move_selected_down()?,
    };
    if moved {
        editor.save()?;
        println!("Slide {} moved", args.index);
    } else {
        println!("Slide {} is already at the edge", args.index);
    }
    Ok(())
}

fn run_set_mouse(args: &SetMouseArgs) -> anyhow::Result<()> {
    let mut editor = open_editor(&args.dir)?;
    editor.select_slide(args.slide)?;
    editor.commit_mouse_action(args.action, args.x, args.y)?;
    editor.save()?;
    Ok(())
}

fn run_set_size(args: &SetSizeArgs) -> anyhow::Result<()> {
    let mut editor = open_editor(&args.dir)?;
    editor.set_output_size(args.width, args.height)?;
    editor.save()?;
    print_info(&editor);
    Ok(())
}

fn run_generate(args: &ProjectArgs) -> anyhow::Result<()> {
    let mut editor = open_editor(&args.dir)?;
    let report = editor.generate()?;
    println!("Project successfully built: {:?}", report.html_path);
    Ok(())
}

fn run_clean(args: &ProjectArgs) -> anyhow::Result<()> {
    let mut editor = open_editor(&args.dir)?;
    editor.clean()?;
    println!("Build directory cleaned");
    Ok(())
}

fn run_prune(args: &ProjectArgs) -> anyhow::Result<()> {
    let editor = open_editor(&args.dir)?;
    if let Some(session) = editor.session() {
        for path in session.prune_orphan_images()? {
            println!("Removed {:?}", path);
        }
    }
    Ok(())
}

fn run_preview(args: &PreviewArgs) -> anyhow::Result<()> {
    let editor = open_editor(&args.dir)?;
    if let Some(session) = editor.session() {
        clickcast::preview::serve(
            &session.build_dir(),
            &session.config().html_file_name,
            args.port,
        )?;
    }
    Ok(())
}

fn run_settings(args: &SettingsArgs) -> anyhow::Result<()> {
    let mut editor = build_editor(ScreenSource::from_env(), (0.5, 0.5))?;
    if let Some(key) = &args.capture_key {
        editor.set_capture_key(key)?;
    }
    if args.default_width.is_some() || args.default_height.is_some() {
        let current = editor.settings().settings().clone();
        editor.set_default_size(
            args.default_width.unwrap_or(current.default_width),
            args.default_height.unwrap_or(current.default_height),
        )?;
    }
    if let Some(speed) = args.default_speed {
        editor.set_default_speed(speed)?;
    }
    println!("Settings file: {:?}", editor.settings().path());
    println!("{}", serde_json::to_string_pretty(editor.settings().settings())?);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Some(Commands::New(args)) => run_new(args),
        Some(Commands::Info(args)) => open_editor(&args.dir).map(|editor| print_info(&editor)),
        Some(Commands::Capture(args)) => run_capture(args),
        Some(Commands::RemoveSlide(args)) => run_remove_slide(args),
        Some(Commands::MoveSlide(args)) => run_move_slide(args),
        Some(Commands::SetMouse(args)) => run_set_mouse(args),
        Some(Commands::SetSize(args)) => run_set_size(args),
        Some(Commands::Generate(args)) => run_generate(args),
        Some(Commands::Clean(args)) => run_clean(args),
        Some(Commands::Prune(args)) => run_prune(args),
        Some(Commands::Preview(args)) => run_preview(args),
        Some(Commands::Settings(args)) => run_settings(args),
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
