use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pdf_canvas_core::{
    Color, EditorConfig, EditorSession, KeyEvent, ObjectKind, PointerEvent, ShapeKind, ToolMode,
    ToolOutcome, PDF_MIME,
};
use pdf_engine::{default_engine, OpenSource, PdfEngine};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `debug` or
/// `pdf_canvas_core=trace`.
pub const LOG_ENV: &str = "PDF_CANVAS_LOG";

/// Installs the stderr log subscriber. Defaults to warnings only.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Parser)]
#[command(name = "pdf-canvas-cli")]
#[command(about = "Inspect PDFs and replay canvas edits")]
pub struct Cli {
    /// Editor settings file (TOML). `PDF_CANVAS_*` variables override it.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Print the text runs of a page with their canvas hit boxes.
    Text {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Render a page to PNG.
    Render {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Zoom factor; defaults to the configured zoom.
        #[arg(long)]
        zoom: Option<f32>,
        /// Clockwise rotation in degrees (0, 90, 180 or 270).
        #[arg(long, default_value_t = 0)]
        rotation: i32,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a JSON edit script against a page and export the result.
    Edit {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long, value_name = "SCRIPT")]
        script: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the effective editor configuration as TOML.
    Config,
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    first_page_size_pt: Option<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize)]
struct TextRunOutput {
    text: String,
    font_size: f32,
    x: f32,
    y: f32,
    hit_box: [f32; 4],
}

/// One step of an edit script.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum Step {
    Tool { mode: ToolMode },
    Toggle { mode: ToolMode },
    Shape { kind: ShapeKind },
    Down { x: f32, y: f32, #[serde(default)] t: u64 },
    Move { x: f32, y: f32, #[serde(default)] t: u64 },
    Up { x: f32, y: f32, #[serde(default)] t: u64 },
    /// Press and release in place
    Click { x: f32, y: f32 },
    /// Press, move and release
    Drag { from: [f32; 2], to: [f32; 2] },
    Link { text: String, url: String },
    Image { path: PathBuf },
    Signature { path: PathBuf },
    /// Replace the text of the selected object
    Text { content: String },
    Bold,
    Italic,
    Underline,
    FontSize { size: f32 },
    TextColor { color: Color },
    AnnotationColors { text: Color, background: Color },
    Key(KeyEvent),
    Delete,
    Undo,
    NextPage,
    PrevPage,
    GoTo { page: u32 },
    ZoomIn,
    ZoomOut,
    Rotate,
}

#[derive(Debug, Deserialize)]
struct Script {
    #[serde(default = "first_page")]
    page: u32,
    steps: Vec<Step>,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Serialize)]
struct EditSummary {
    output: String,
    page: u32,
    zoom: f32,
    rotation: u16,
    objects: Vec<&'static str>,
    history_len: usize,
    can_undo: bool,
    opened_links: Vec<String>,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Text { file, page } => run_text(&file, page, config),
        Commands::Render { file, page, zoom, rotation, output } => {
            run_render(&file, page, zoom, rotation, output.as_deref(), config)
        }
        Commands::Edit { file, script, output } => run_edit(&file, &script, &output, config),
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    let base = match path {
        Some(path) => EditorConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => EditorConfig::default(),
    };
    base.apply_env(|key| std::env::var(key).ok()).context("invalid PDF_CANVAS_* environment")
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let mut engine = default_engine();
    let handle = engine.open(OpenSource::from(file)).context("failed to open PDF")?;

    let page_count = engine.page_count(handle)?;
    let first_page_size_pt = if page_count > 0 {
        let size = engine.page_size(handle, 0)?;
        Some(PageSizeOutput { width: size.width_pt, height: size.height_pt })
    } else {
        None
    };

    let payload = InfoOutput { path: file.display().to_string(), page_count, first_page_size_pt };
    println!("{}", serde_json::to_string_pretty(&payload)?);

    engine.close(handle)?;
    Ok(())
}

/// Loads `file` into a session and shows `page`.
fn open_session(file: &Path, page: u32, config: EditorConfig) -> Result<EditorSession> {
    ensure_pdf_exists(file)?;
    if page == 0 {
        anyhow::bail!("--page is 1-based and must be >= 1");
    }

    let bytes = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut session = EditorSession::new(default_engine(), config);
    session.load_pdf(bytes, PDF_MIME).context("failed to open PDF")?;

    let page_count = session.document().map_or(0, |d| d.page_count());
    if page > page_count {
        anyhow::bail!("page {page} out of range (document has {page_count} pages)");
    }
    session.go_to_page(page)?;
    Ok(session)
}

fn run_text(file: &Path, page: u32, config: EditorConfig) -> Result<()> {
    let session = open_session(file, page, config)?;
    let runs: Vec<TextRunOutput> = session
        .page_text()
        .map(|text| {
            text.placements()
                .zip(text.items.iter())
                .map(|(placement, item)| TextRunOutput {
                    text: item.text.clone(),
                    font_size: placement.font_size,
                    x: placement.origin.x,
                    y: placement.origin.y,
                    hit_box: [
                        placement.hit_box.left,
                        placement.hit_box.top,
                        placement.hit_box.width,
                        placement.hit_box.height,
                    ],
                })
                .collect()
        })
        .unwrap_or_default();

    println!("{}", serde_json::to_string_pretty(&runs)?);
    Ok(())
}

fn run_render(
    file: &Path,
    page: u32,
    zoom: Option<f32>,
    rotation: i32,
    output: Option<&Path>,
    mut config: EditorConfig,
) -> Result<()> {
    let turns = match rotation.rem_euclid(360) {
        r if r % 90 == 0 => r / 90,
        _ => anyhow::bail!("--rotation must be a multiple of 90, got {rotation}"),
    };
    if let Some(zoom) = zoom {
        config = config.with_default_zoom(zoom);
        config.validate().with_context(|| {
            format!("--zoom must be between {} and {}", config.min_zoom, config.max_zoom)
        })?;
    }

    let mut session = open_session(file, page, config)?;
    for _ in 0..turns {
        session.rotate()?;
    }

    let output = output.map(ToOwned::to_owned).unwrap_or_else(|| default_render_output(file, page));
    write_export(&session, &output)?;
    println!("{}", output.display());
    Ok(())
}

fn run_edit(file: &Path, script_path: &Path, output: &Path, config: EditorConfig) -> Result<()> {
    let raw = fs::read_to_string(script_path)
        .with_context(|| format!("failed to read script {}", script_path.display()))?;
    let script: Script = serde_json::from_str(&raw).context("failed to parse edit script")?;

    let mut session = open_session(file, script.page, config)?;
    let mut opened_links = Vec::new();

    for (index, step) in script.steps.into_iter().enumerate() {
        tracing::debug!(index, ?step, "replaying step");
        let links = apply_step(&mut session, step)
            .with_context(|| format!("step {} failed", index + 1))?;
        opened_links.extend(links);
    }

    write_export(&session, output)?;

    let document = session.document().context("no document loaded")?;
    let summary = EditSummary {
        output: output.display().to_string(),
        page: document.current_page(),
        zoom: document.zoom(),
        rotation: document.rotation().degrees(),
        objects: session.scene().overlays().map(|o| kind_name(&o.kind)).collect(),
        history_len: session.history().len(),
        can_undo: session.can_undo(),
        opened_links,
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Applies one step, returning any links the step opened.
fn apply_step(session: &mut EditorSession, step: Step) -> Result<Vec<String>> {
    match step {
        Step::Tool { mode } => session.activate_tool(mode),
        Step::Toggle { mode } => session.toggle_tool(mode),
        Step::Shape { kind } => session.start_drawing_shape(kind),
        Step::Down { x, y, t } => {
            return Ok(replay_pointer(session, &[PointerEvent::down(x, y).at(t)]));
        }
        Step::Move { x, y, t } => {
            return Ok(replay_pointer(session, &[PointerEvent::moved(x, y).at(t)]));
        }
        Step::Up { x, y, t } => {
            return Ok(replay_pointer(session, &[PointerEvent::up(x, y).at(t)]));
        }
        Step::Click { x, y } => {
            return Ok(replay_pointer(session, &[PointerEvent::down(x, y), PointerEvent::up(x, y)]));
        }
        Step::Drag { from, to } => {
            let events = [
                PointerEvent::down(from[0], from[1]),
                PointerEvent::moved(to[0], to[1]),
                PointerEvent::up(to[0], to[1]),
            ];
            return Ok(replay_pointer(session, &events));
        }
        Step::Link { text, url } => {
            session.add_link(&text, &url)?;
        }
        Step::Image { path } => {
            let (bytes, mime) = read_image(&path)?;
            session.add_image(&bytes, mime)?;
        }
        Step::Signature { path } => {
            let (bytes, mime) = read_image(&path)?;
            session.add_signature_image(&bytes, mime)?;
        }
        Step::Text { content } => {
            if !session.begin_text_editing() {
                anyhow::bail!("no text object is selected");
            }
            session.commit_text(&content);
        }
        Step::Bold => {
            session.toggle_bold();
        }
        Step::Italic => {
            session.toggle_italic();
        }
        Step::Underline => {
            session.toggle_underline();
        }
        Step::FontSize { size } => {
            session.set_font_size(size)?;
        }
        Step::TextColor { color } => {
            session.set_text_color(color);
        }
        Step::AnnotationColors { text, background } => {
            session.set_annotation_colors(text, background);
        }
        Step::Key(event) => {
            session.handle_key_event(&event)?;
        }
        Step::Delete => {
            session.delete_selected();
        }
        Step::Undo => {
            session.undo()?;
        }
        Step::NextPage => {
            session.next_page()?;
        }
        Step::PrevPage => {
            session.prev_page()?;
        }
        Step::GoTo { page } => {
            session.go_to_page(page)?;
        }
        Step::ZoomIn => {
            session.zoom_in()?;
        }
        Step::ZoomOut => {
            session.zoom_out()?;
        }
        Step::Rotate => {
            session.rotate()?;
        }
    }
    Ok(Vec::new())
}

/// Feeds pointer events to the session and collects the links they opened.
fn replay_pointer(session: &mut EditorSession, events: &[PointerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match session.handle_pointer_event(event) {
            ToolOutcome::OpenLink(url) => Some(url),
            _ => None,
        })
        .collect()
}

fn read_image(path: &Path) -> Result<(Vec<u8>, &'static str)> {
    let bytes = fs::read(path).with_context(|| format!("failed to read image {}", path.display()))?;
    let mime = match image::guess_format(&bytes) {
        Ok(format) => format.to_mime_type(),
        Err(_) => "application/octet-stream",
    };
    Ok((bytes, mime))
}

fn write_export(session: &EditorSession, output: &Path) -> Result<()> {
    let png = session.export_current_view_as_image().context("failed to export page")?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, png).with_context(|| format!("failed to write image to {}", output.display()))
}

fn kind_name(kind: &ObjectKind) -> &'static str {
    match kind {
        ObjectKind::Background { .. } => "background",
        ObjectKind::Text { .. } => "text",
        ObjectKind::Shape { .. } => "shape",
        ObjectKind::Image { .. } => "image",
        ObjectKind::Annotation { .. } => "annotation",
        ObjectKind::Link { .. } => "link",
        ObjectKind::SignatureStroke { .. } => "signature_stroke",
    }
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}

fn default_render_output(file: &Path, page: u32) -> PathBuf {
    let stem = file.file_stem().and_then(|name| name.to_str()).unwrap_or("page");

    file.with_file_name(format!("{stem}-page-{page}.png"))
}
