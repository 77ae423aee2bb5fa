//! Viewport lifecycle tests against a recording backend.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use image::{Rgba, RgbaImage};

use super::*;
use crate::event::Point;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Attach(u32, u32),
    Resize(u32, u32),
    Upload(u32, u32),
    Release(TextureId),
    Render { meshes: usize, lights: usize },
    Detach,
}

/// Backend that records calls into a log shared with the test.
#[derive(Default)]
struct RecordingBackend {
    calls: Rc<RefCell<Vec<Call>>>,
    next_id: u64,
    fail_uploads: bool,
}

impl RecordingBackend {
    fn new() -> (Self, Rc<RefCell<Vec<Call>>>) {
        let backend = Self::default();
        let calls = Rc::clone(&backend.calls);
        (backend, calls)
    }
}

impl RenderBackend for RecordingBackend {
    fn attach(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.calls.borrow_mut().push(Call::Attach(width, height));
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.borrow_mut().push(Call::Resize(width, height));
    }

    fn upload_texture(&mut self, image: &RgbaImage) -> Result<TextureId, TextureLoadError> {
        if self.fail_uploads {
            return Err(TextureLoadError::Upload("out of memory".into()));
        }
        self.calls
            .borrow_mut()
            .push(Call::Upload(image.width(), image.height()));
        self.next_id += 1;
        Ok(TextureId::new(self.next_id))
    }

    fn release_texture(&mut self, id: TextureId) {
        self.calls.borrow_mut().push(Call::Release(id));
    }

    fn render(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        self.calls.borrow_mut().push(Call::Render {
            meshes: frame.scene.meshes().len(),
            lights: frame.scene.lights().len(),
        });
        Ok(())
    }

    fn detach(&mut self) {
        self.calls.borrow_mut().push(Call::Detach);
    }
}

#[derive(Default, Clone)]
struct Scheduler {
    requests: Rc<Cell<u32>>,
}

impl FrameScheduler for Scheduler {
    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

fn floor_image() -> ImageSource {
    ImageSource::Decoded {
        name: "floor".into(),
        image: RgbaImage::from_pixel(8, 4, Rgba([200, 180, 160, 255])),
    }
}

fn mount(
    image: Option<ImageSource>,
) -> (
    ViewportHandle<RecordingBackend, Scheduler>,
    Rc<RefCell<Vec<Call>>>,
    Scheduler,
) {
    let (backend, calls) = RecordingBackend::new();
    let scheduler = Scheduler::default();
    let handle = ViewportHandle::mount(
        backend,
        scheduler.clone(),
        (800, 600),
        image,
        &ViewerConfig::default(),
    )
    .unwrap();
    (handle, calls, scheduler)
}

#[test]
fn test_mount_without_image_is_idle() {
    let (mut handle, calls, scheduler) = mount(None);
    assert!(handle.is_idle());
    handle.on_frame().unwrap();
    assert!(calls.borrow().is_empty());
    assert_eq!(scheduler.requests.get(), 0);
    assert!(handle.scene().is_empty());
}

#[test]
fn test_mount_builds_textured_room() {
    let (mut handle, calls, scheduler) = mount(Some(floor_image()));
    assert!(!handle.is_idle());
    assert_eq!(calls.borrow()[0], Call::Attach(800, 600));
    assert_eq!(scheduler.requests.get(), 1);
    assert_eq!(handle.state().aspect, 800.0 / 600.0);
    assert_eq!(handle.state().fov_y_degrees, 75.0);

    assert!(handle.wait_for_texture(Duration::from_secs(5)));
    assert_eq!(handle.scene().meshes().len(), 5);
    assert_eq!(handle.scene().lights().len(), 2);

    handle.on_frame().unwrap();
    assert!(calls.borrow().contains(&Call::Upload(8, 4)));
    assert_eq!(
        calls.borrow().last(),
        Some(&Call::Render {
            meshes: 5,
            lights: 2
        })
    );
    assert_eq!(scheduler.requests.get(), 2);
}

#[test]
fn test_texture_failure_keeps_lights_and_calls_back() {
    let (mut handle, _calls, _) = mount(Some(ImageSource::from_bytes("broken.png", vec![1, 2, 3])));
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    handle.set_texture_error_callback(move |e| sink.borrow_mut().push(e.to_string()));

    assert!(handle.wait_for_texture(Duration::from_secs(5)));
    assert_eq!(errors.borrow().len(), 1);
    assert!(handle.scene().meshes().is_empty());
    assert_eq!(handle.scene().lights().len(), 2);
    assert!(handle.on_frame().is_ok());
    assert!(!handle.is_idle());
}

#[test]
fn test_upload_failure_degrades() {
    let (mut backend, _calls) = RecordingBackend::new();
    backend.fail_uploads = true;
    let mut handle = ViewportHandle::mount(
        backend,
        Scheduler::default(),
        (100, 100),
        Some(floor_image()),
        &ViewerConfig::default(),
    )
    .unwrap();
    let failed = Rc::new(Cell::new(false));
    let flag = Rc::clone(&failed);
    handle.set_texture_error_callback(move |e| {
        flag.set(matches!(e, TextureLoadError::Upload(_)));
    });

    handle.wait_for_texture(Duration::from_secs(5));
    assert!(failed.get());
    assert!(handle.scene().meshes().is_empty());
}

#[test]
fn test_failure_before_callback_is_delivered_late() {
    let (mut backend, _calls) = RecordingBackend::new();
    backend.fail_uploads = true;
    let mut handle = ViewportHandle::mount(
        backend,
        Scheduler::default(),
        (100, 100),
        Some(floor_image()),
        &ViewerConfig::default(),
    )
    .unwrap();
    assert!(handle.wait_for_texture(Duration::from_secs(5)));

    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&errors);
    handle.set_texture_error_callback(move |e| sink.borrow_mut().push(e.to_string()));
    assert_eq!(errors.borrow().len(), 1);
    assert!(errors.borrow()[0].contains("out of memory"));

    // Delivered once only.
    let sink = Rc::clone(&errors);
    handle.set_texture_error_callback(move |e| sink.borrow_mut().push(e.to_string()));
    assert_eq!(errors.borrow().len(), 1);
}

#[test]
fn test_resize_updates_aspect_and_surface() {
    let (mut handle, calls, _) = mount(Some(floor_image()));
    handle.resize(1000, 0);
    assert_eq!(handle.state().aspect, 1000.0);
    assert_eq!(calls.borrow().last(), Some(&Call::Resize(1000, 1)));
}

#[test]
fn test_unmount_stops_loop_and_releases() {
    let (mut handle, calls, scheduler) = mount(Some(floor_image()));
    handle.wait_for_texture(Duration::from_secs(5));
    handle.on_frame().unwrap();
    let requests = scheduler.requests.get();

    handle.unmount();
    let calls = calls.borrow();
    assert!(calls.contains(&Call::Release(TextureId::new(1))));
    assert_eq!(calls.last(), Some(&Call::Detach));
    assert_eq!(calls.iter().filter(|c| **c == Call::Detach).count(), 1);
    assert_eq!(scheduler.requests.get(), requests);
}

#[test]
fn test_drop_detaches() {
    let (handle, calls, _) = mount(Some(floor_image()));
    drop(handle);
    assert_eq!(calls.borrow().last(), Some(&Call::Detach));
}

#[test]
fn test_replace_image_swaps_texture() {
    let (mut handle, calls, _) = mount(Some(floor_image()));
    handle.wait_for_texture(Duration::from_secs(5));
    let first_revision = handle.scene().revision();

    handle
        .replace_image(Some(ImageSource::Decoded {
            name: "second".into(),
            image: RgbaImage::new(2, 2),
        }))
        .unwrap();
    assert!(handle.scene().meshes().is_empty());
    assert!(calls.borrow().contains(&Call::Release(TextureId::new(1))));

    handle.wait_for_texture(Duration::from_secs(5));
    assert_eq!(handle.scene().meshes().len(), 5);
    assert!(handle.scene().revision() > first_revision);
    assert!(calls.borrow().contains(&Call::Upload(2, 2)));
    // Attached once only.
    let attaches = calls
        .borrow()
        .iter()
        .filter(|c| matches!(c, Call::Attach(..)))
        .count();
    assert_eq!(attaches, 1);
}

#[test]
fn test_replace_with_none_goes_idle() {
    let (mut handle, _calls, _) = mount(Some(floor_image()));
    handle.wait_for_texture(Duration::from_secs(5));
    handle.replace_image(None).unwrap();
    assert!(handle.is_idle());
    assert!(handle.scene().meshes().is_empty());
    assert!(!handle.is_loading());
}

#[test]
fn test_stale_texture_is_discarded() {
    let (mut handle, calls, _) = mount(Some(floor_image()));
    // Supersede before the first load is applied.
    handle
        .replace_image(Some(ImageSource::Decoded {
            name: "latest".into(),
            image: RgbaImage::new(3, 3),
        }))
        .unwrap();
    handle.wait_for_texture(Duration::from_secs(5));

    let uploads: Vec<_> = calls
        .borrow()
        .iter()
        .filter(|c| matches!(c, Call::Upload(..)))
        .cloned()
        .collect();
    assert_eq!(uploads, vec![Call::Upload(3, 3)]);
}

#[test]
fn test_pointer_drag_orbits_camera() {
    let (mut handle, _calls, _) = mount(Some(floor_image()));
    let start = handle.camera().position();

    assert!(!handle.handle_event(&PointerEvent::Moved {
        position: Point::new(50.0, 0.0)
    }));
    handle.handle_event(&PointerEvent::Pressed {
        button: MouseButton::Left,
        position: Point::new(0.0, 0.0),
    });
    assert!(handle.handle_event(&PointerEvent::Moved {
        position: Point::new(40.0, 10.0)
    }));
    handle.handle_event(&PointerEvent::Released {
        button: MouseButton::Left,
        position: Point::new(40.0, 10.0),
    });
    assert!(!handle.camera().is_dragging());

    let moved = handle.camera().position();
    assert_ne!(moved, start);
    assert!((moved.length() - start.length()).abs() < 1e-4);
}

#[test]
fn test_wheel_zooms() {
    let (mut handle, _calls, _) = mount(Some(floor_image()));
    for _ in 0..5 {
        handle.handle_event(&PointerEvent::Wheel {
            delta_y: -1000.0,
            position: Point::default(),
        });
    }
    assert!((handle.camera().distance() - 2.0).abs() < 1e-4);
    assert!(!handle.handle_event(&PointerEvent::Wheel {
        delta_y: -1000.0,
        position: Point::default(),
    }));
}
