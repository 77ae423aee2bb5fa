//! Native front-end: a window showing the room viewport, and a headless
//! selection mode that writes the highlighted image to disk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use planview_gpu::{GpuContext, GpuError};
use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::config::{ConfigError, ViewerConfig};
use crate::constants::DEFAULT_WINDOW_SIZE;
use crate::error::{InferenceError, InputError, RenderError};
use crate::event::{MouseButton, Point, PointerEvent};
use crate::image_source::{ImageSource, is_image_file};
use crate::region_selector::{RegionSelector, SelectorEvent};
use crate::segmentation::LabelMapSegmenter;
use crate::viewport::{ViewportHandle, WgpuBackend};

/// How long the headless mode waits for segmentation.
const ANALYSIS_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Error, Debug)]
pub enum NativeError {
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("Window creation failed: {0}")]
    Window(#[from] winit::error::OsError),

    #[error(transparent)]
    Gpu(#[from] GpuError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Image rejected: {0}")]
    Rejected(String),

    #[error("Analysis failed: {0}")]
    Analysis(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid palette: {0}")]
    Palette(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write image: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Parser, Debug)]
#[command(name = "planview-native", about = "Room viewport and region selector for interior images")]
#[command(version)]
pub struct Cli {
    /// Defaults to `view` without an image
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::View { image: None })
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Open the room viewport. Drag to orbit, scroll to zoom, drop a file
    /// to replace the image, Esc to quit.
    View {
        /// Floor image (PNG, JPEG or WebP)
        image: Option<PathBuf>,
    },
    /// Segment an image with a color-coded label map, select the region
    /// under a pixel and write the highlighted image
    Select(SelectArgs),
    /// Write the default configuration file
    InitConfig,
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct SelectArgs {
    /// Image to segment
    pub image: PathBuf,

    /// Label map of the same size, one color per class
    pub label_map: PathBuf,

    /// JSON palette, a list of `{"label": "...", "color": [r, g, b]}`
    pub palette: PathBuf,

    /// Click position in image pixels
    pub x: f32,

    pub y: f32,

    /// Output file
    #[arg(short, long, default_value = "selection.png")]
    pub output: PathBuf,
}

/// Segment an image, click at a pixel and save the highlighted result.
pub fn run_select(args: &SelectArgs, config: &ViewerConfig) -> Result<(), NativeError> {
    let label_map = ImageSource::Path(args.label_map.clone()).decode()?;
    let palette = LabelMapSegmenter::palette_from_json(&std::fs::read_to_string(&args.palette)?)?;
    log::info!("Palette with {} classes", palette.len());

    let segmenter = Arc::new(LabelMapSegmenter::new(label_map, palette));
    let mut selector = RegionSelector::new(segmenter, config.highlight.into())?;

    let mut events = selector.set_image(Some(ImageSource::Path(args.image.clone())));
    events.extend(selector.wait_for_analysis(ANALYSIS_TIMEOUT));
    for event in &events {
        match event {
            SelectorEvent::InputRejected(message) => {
                return Err(NativeError::Rejected(message.clone()));
            }
            SelectorEvent::AnalysisFailed(message) => {
                return Err(NativeError::Analysis(message.clone()));
            }
            SelectorEvent::Segmented { labels } => {
                let labels: Vec<_> = labels.iter().map(String::as_str).collect();
                println!("Labels: {}", labels.join(", "));
            }
            _ => {}
        }
    }

    // Clicks are given in image pixels: display the canvas at its own size.
    let (width, height) = selector
        .canvas()
        .map(|canvas| (canvas.width() as f32, canvas.height() as f32))
        .ok_or(InputError::NoImage)?;
    match selector.click(Point::new(args.x, args.y), width, height) {
        Some(SelectorEvent::SelectionChanged(label)) => println!("Selected: {}", label),
        _ => println!("Selected: (none)"),
    }

    if let Some(canvas) = selector.canvas() {
        canvas.save(&args.output)?;
        log::info!("Wrote {:?}", args.output);
    }
    Ok(())
}

type NativeViewport = ViewportHandle<WgpuBackend, Arc<Window>>;

struct ViewerApp {
    config: ViewerConfig,
    image: Option<ImageSource>,
    window: Option<Arc<Window>>,
    viewport: Option<NativeViewport>,
    cursor: Point,
    error: Option<NativeError>,
}

impl ViewerApp {
    fn new(image: Option<PathBuf>, config: ViewerConfig) -> Self {
        Self {
            config,
            image: image.map(ImageSource::Path),
            window: None,
            viewport: None,
            cursor: Point::default(),
            error: None,
        }
    }

    fn create_viewport(&mut self, event_loop: &ActiveEventLoop) -> Result<(), NativeError> {
        let (width, height) = DEFAULT_WINDOW_SIZE;
        let window_attrs = WindowAttributes::default()
            .with_title("planview")
            .with_inner_size(winit::dpi::LogicalSize::new(width, height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);
        self.window = Some(Arc::clone(&window));

        let gpu_ctx = pollster::block_on(GpuContext::new(Arc::clone(&window)))?;
        let size = window.inner_size();
        let mut viewport = ViewportHandle::mount(
            WgpuBackend::new(gpu_ctx),
            Arc::clone(&window),
            (size.width, size.height),
            self.image.take(),
            &self.config,
        )?;

        let title_window = Arc::clone(&window);
        viewport.set_texture_error_callback(move |e| {
            title_window.set_title(&format!("planview - {}", e));
        });
        self.viewport = Some(viewport);
        Ok(())
    }

    fn pointer(&mut self, event: PointerEvent) {
        if let Some(viewport) = self.viewport.as_mut() {
            viewport.handle_event(&event);
        }
    }
}

fn map_button(button: winit::event::MouseButton) -> MouseButton {
    match button {
        winit::event::MouseButton::Left => MouseButton::Left,
        winit::event::MouseButton::Right => MouseButton::Right,
        winit::event::MouseButton::Middle => MouseButton::Middle,
        winit::event::MouseButton::Back => MouseButton::Other(3),
        winit::event::MouseButton::Forward => MouseButton::Other(4),
        winit::event::MouseButton::Other(n) => MouseButton::Other(n),
    }
}

/// Only files with an image extension replace the floor.
fn accepts_dropped(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(is_image_file)
}

/// Wheel delta in pixels, positive when scrolling down.
fn wheel_delta(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * 100.0,
        MouseScrollDelta::PixelDelta(pos) => -pos.y as f32,
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.create_viewport(event_loop) {
            log::error!("Failed to start viewer: {}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => {
                if let Some(viewport) = self.viewport.take() {
                    viewport.unmount();
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(viewport) = self.viewport.as_mut() {
                    viewport.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(viewport) = self.viewport.as_mut() {
                    if let Err(e) = viewport.on_frame() {
                        log::error!("Render error: {}", e);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = map_button(button);
                let position = self.cursor;
                self.pointer(match state {
                    ElementState::Pressed => PointerEvent::Pressed { button, position },
                    ElementState::Released => PointerEvent::Released { button, position },
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Point::new(position.x as f32, position.y as f32);
                self.pointer(PointerEvent::Moved {
                    position: self.cursor,
                });
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.pointer(PointerEvent::Wheel {
                    delta_y: wheel_delta(delta),
                    position: self.cursor,
                });
            }
            WindowEvent::DroppedFile(path) => {
                if !accepts_dropped(&path) {
                    log::warn!("Ignoring dropped file {:?}: not a supported image", path);
                    return;
                }
                if let Some(viewport) = self.viewport.as_mut() {
                    log::info!("Replacing floor image with {:?}", path);
                    if let Err(e) = viewport.replace_image(Some(ImageSource::Path(path))) {
                        log::error!("Failed to replace image: {}", e);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Open the viewport window and run until it is closed.
pub fn run_viewer(image: Option<PathBuf>, config: ViewerConfig) -> Result<(), NativeError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = ViewerApp::new(image, config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Command, clap::Error> {
        Cli::try_parse_from(std::iter::once("planview-native").chain(args.iter().copied()))
            .map(Cli::into_command)
    }

    #[test]
    fn test_parse_view() {
        assert_eq!(parse(&[]).unwrap(), Command::View { image: None });
        assert_eq!(
            parse(&["view", "room.png"]).unwrap(),
            Command::View {
                image: Some(PathBuf::from("room.png"))
            }
        );
        assert_eq!(parse(&["init-config"]).unwrap(), Command::InitConfig);
    }

    #[test]
    fn test_parse_select() {
        let command = parse(&["select", "a.png", "map.png", "p.json", "10", "20.5"]).unwrap();
        let Command::Select(select) = command else {
            panic!("expected select command");
        };
        assert_eq!(select.x, 10.0);
        assert_eq!(select.y, 20.5);
        assert_eq!(select.output, PathBuf::from("selection.png"));

        let command =
            parse(&["select", "a.png", "map.png", "p.json", "1", "2", "-o", "out.png"]).unwrap();
        let Command::Select(select) = command else {
            panic!("expected select command");
        };
        assert_eq!(select.output, PathBuf::from("out.png"));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(parse(&["select", "a.png"]).is_err());
        assert!(parse(&["select", "a", "b", "c", "x", "1"]).is_err());
        assert!(parse(&["view", "a.png", "b.png"]).is_err());
        assert!(parse(&["explode"]).is_err());
    }

    #[test]
    fn test_only_image_files_are_accepted_on_drop() {
        assert!(accepts_dropped(Path::new("/tmp/room.JPG")));
        assert!(accepts_dropped(Path::new("plan.webp")));
        assert!(!accepts_dropped(Path::new("/tmp/notes.txt")));
        assert!(!accepts_dropped(Path::new("/tmp/")));
    }

    #[test]
    fn test_select_reports_analysis_failure() {
        let dir = std::env::temp_dir().join(format!("planview-select-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let image_path = dir.join("room.png");
        let map_path = dir.join("map.png");
        let palette_path = dir.join("palette.json");
        image::RgbaImage::new(4, 4).save(&image_path).unwrap();
        image::RgbaImage::new(2, 2).save(&map_path).unwrap();
        std::fs::write(&palette_path, r#"[{"label": "floor", "color": [0, 0, 0]}]"#).unwrap();

        let args = SelectArgs {
            image: image_path,
            label_map: map_path,
            palette: palette_path,
            x: 1.0,
            y: 1.0,
            output: dir.join("out.png"),
        };
        let result = run_select(&args, &ViewerConfig::default());
        std::fs::remove_dir_all(&dir).ok();

        assert!(matches!(result, Err(NativeError::Analysis(_))), "{result:?}");
    }

    #[test]
    fn test_wheel_delta_convention() {
        assert_eq!(wheel_delta(MouseScrollDelta::LineDelta(0.0, 1.0)), -100.0);
        assert_eq!(
            wheel_delta(MouseScrollDelta::PixelDelta(winit::dpi::PhysicalPosition::new(0.0, -30.0))),
            30.0
        );
    }
}
