//! Interactive 3D room viewport.
//!
//! A [`ViewportHandle`] owns everything one mounted viewport needs: the
//! scene, the orbit camera, the render loop and the backend surface. The
//! source image becomes the floor texture once decoded in the background;
//! until then, or if decoding fails, only the lit empty scene is drawn.

mod backend;
#[cfg(not(target_arch = "wasm32"))]
mod gpu_backend;
mod render_loop;
mod scene;
mod texture_loader;

pub use backend::{Frame, RenderBackend, TextureId};
#[cfg(not(target_arch = "wasm32"))]
pub use gpu_backend::WgpuBackend;
pub use render_loop::{FrameScheduler, RenderLoop};
pub use scene::{Light, Material, Mesh, Scene, build_room, room_lights};
pub use texture_loader::{LoadedTexture, TextureLoader};

use std::time::{Duration, Instant};

use crate::camera::{CameraRig, PerspectiveCamera, ViewportState};
use crate::config::{RoomConfig, ViewerConfig};
use crate::error::{InputError, RenderError, TextureLoadError};
use crate::event::{MouseButton, PointerEvent};
use crate::image_source::ImageSource;

type TextureErrorCallback = Box<dyn FnMut(&TextureLoadError)>;

pub struct ViewportHandle<B: RenderBackend, S: FrameScheduler> {
    backend: B,
    render_loop: RenderLoop<S>,
    scene: Scene,
    rig: CameraRig,
    perspective: PerspectiveCamera,
    room: RoomConfig,
    size: (u32, u32),
    attached: bool,
    loader: Option<TextureLoader>,
    pending_texture: Option<u64>,
    floor_texture: Option<TextureId>,
    on_texture_error: Option<TextureErrorCallback>,
    /// Failure raised before a callback was installed.
    unreported_error: Option<TextureLoadError>,
}

impl<B: RenderBackend, S: FrameScheduler> ViewportHandle<B, S> {
    /// Mount a viewport of `size` showing `image` as the floor.
    ///
    /// With no image the handle stays idle: nothing is attached or drawn
    /// until [`replace_image`](Self::replace_image) supplies one.
    pub fn mount(
        backend: B,
        scheduler: S,
        size: (u32, u32),
        image: Option<ImageSource>,
        config: &ViewerConfig,
    ) -> Result<Self, RenderError> {
        let size = (size.0.max(1), size.1.max(1));
        let mut handle = Self {
            backend,
            render_loop: RenderLoop::new(scheduler),
            scene: Scene::new(config.room.background),
            rig: CameraRig::new(&config.camera),
            perspective: PerspectiveCamera::new(&config.camera, size.0, size.1),
            room: config.room.clone(),
            size,
            attached: false,
            loader: None,
            pending_texture: None,
            floor_texture: None,
            on_texture_error: None,
            unreported_error: None,
        };

        match image {
            Some(source) => handle.activate(source)?,
            None => log::info!("Viewport idle: {}", InputError::NoImage),
        }
        Ok(handle)
    }

    /// Called when a texture fails to load or upload. The scene keeps
    /// drawing without geometry either way. A failure that happened before
    /// the callback was installed is delivered immediately.
    pub fn set_texture_error_callback(&mut self, callback: impl FnMut(&TextureLoadError) + 'static) {
        let mut callback: TextureErrorCallback = Box::new(callback);
        if let Some(error) = self.unreported_error.take() {
            callback(&error);
        }
        self.on_texture_error = Some(callback);
    }

    fn activate(&mut self, source: ImageSource) -> Result<(), RenderError> {
        if !self.attached {
            self.backend.attach(self.size.0, self.size.1)?;
            self.attached = true;
        }
        if self.scene.lights().is_empty() {
            self.scene.set_lights(room_lights(&self.room));
        }
        self.request_texture(source);
        self.render_loop.start();
        log::info!("Viewport mounted at {}x{}", self.size.0, self.size.1);
        Ok(())
    }

    fn request_texture(&mut self, source: ImageSource) {
        if self.loader.is_none() {
            match TextureLoader::spawn() {
                Ok(loader) => self.loader = Some(loader),
                Err(e) => {
                    self.texture_failed(e);
                    return;
                }
            }
        }
        let Some(loader) = self.loader.as_mut() else {
            return;
        };
        match loader.load(source) {
            Ok(generation) => self.pending_texture = Some(generation),
            Err(e) => self.texture_failed(e),
        }
    }

    fn texture_failed(&mut self, error: TextureLoadError) {
        log::warn!("Floor texture unavailable: {}", error);
        self.pending_texture = None;
        match self.on_texture_error.as_mut() {
            Some(callback) => callback(&error),
            None => self.unreported_error = Some(error),
        }
    }

    /// Remove the floor and walls and release the floor texture.
    fn clear_geometry(&mut self) {
        self.scene.take_meshes();
        if let Some(id) = self.floor_texture.take() {
            self.backend.release_texture(id);
        }
    }

    /// Swap the floor image. Loads still in flight for the old image are
    /// discarded. `None` returns the handle to idle.
    pub fn replace_image(&mut self, image: Option<ImageSource>) -> Result<(), RenderError> {
        self.clear_geometry();
        if let Some(loader) = self.loader.as_mut() {
            loader.invalidate();
        }
        self.pending_texture = None;

        match image {
            Some(source) => self.activate(source),
            None => {
                log::info!("Viewport idle: {}", InputError::NoImage);
                self.render_loop.stop();
                Ok(())
            }
        }
    }

    /// Apply finished texture loads.
    pub fn poll_texture(&mut self) {
        loop {
            let received = match self.loader.as_ref() {
                Some(loader) => loader.try_recv(),
                None => return,
            };
            match received {
                Ok(Some(loaded)) => self.apply_texture(loaded),
                Ok(None) => return,
                Err(e) => {
                    self.loader = None;
                    if self.pending_texture.is_some() {
                        self.texture_failed(e);
                    }
                    return;
                }
            }
        }
    }

    /// Block until the pending texture is applied or `timeout` elapses.
    /// Returns true if no load is pending afterwards.
    pub fn wait_for_texture(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while self.pending_texture.is_some() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            let received = match self.loader.as_ref() {
                Some(loader) => loader.recv_timeout(remaining),
                None => return true,
            };
            match received {
                Ok(Some(loaded)) => self.apply_texture(loaded),
                Ok(None) => {}
                Err(e) => {
                    self.loader = None;
                    self.texture_failed(e);
                }
            }
        }
        true
    }

    fn apply_texture(&mut self, loaded: LoadedTexture) {
        let current = self
            .loader
            .as_ref()
            .is_some_and(|loader| loader.is_current(&loaded));
        if !current || self.pending_texture.is_none() {
            log::debug!("Dropping stale texture (generation {})", loaded.generation);
            return;
        }
        self.pending_texture = None;

        let image = match loaded.result {
            Ok(image) => image,
            Err(e) => return self.texture_failed(e),
        };
        match self.backend.upload_texture(&image) {
            Ok(id) => {
                self.clear_geometry();
                self.floor_texture = Some(id);
                self.scene.set_meshes(build_room(&self.room, id));
                log::info!(
                    "Floor texture applied ({}x{})",
                    image.width(),
                    image.height()
                );
            }
            Err(e) => self.texture_failed(e),
        }
    }

    /// Container resized.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = (width.max(1), height.max(1));
        self.perspective.set_viewport(self.size.0, self.size.1);
        if self.attached {
            self.backend.resize(self.size.0, self.size.1);
        }
    }

    /// Feed pointer input to the camera. Returns true if the view changed.
    pub fn handle_event(&mut self, event: &PointerEvent) -> bool {
        match *event {
            PointerEvent::Pressed {
                button: MouseButton::Left,
                position,
            } => {
                self.rig.begin_drag(position.x, position.y);
                false
            }
            PointerEvent::Moved { position } => self.rig.drag(position.x, position.y),
            PointerEvent::Released {
                button: MouseButton::Left,
                ..
            } => {
                self.rig.end_drag();
                false
            }
            PointerEvent::Wheel { delta_y, .. } => self.rig.zoom(delta_y),
            _ => false,
        }
    }

    /// Frame callback from the host scheduler. Draws the scene and schedules
    /// the next frame; does nothing once stopped.
    pub fn on_frame(&mut self) -> Result<(), RenderError> {
        if !self.render_loop.is_running() {
            return Ok(());
        }
        self.poll_texture();

        let state = self.state();
        let frame = Frame {
            scene: &self.scene,
            view_proj: state.view_projection(),
            eye: state.camera_position,
        };
        let result = self.backend.render(&frame);
        self.render_loop.frame_done();

        match result {
            Err(RenderError::SurfaceLost) => {
                log::debug!("Surface lost, skipped frame");
                Ok(())
            }
            other => other,
        }
    }

    pub fn state(&self) -> ViewportState {
        ViewportState::capture(&self.rig, &self.perspective)
    }

    pub fn camera(&self) -> &CameraRig {
        &self.rig
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// True while nothing is being rendered.
    pub fn is_idle(&self) -> bool {
        !self.render_loop.is_running()
    }

    pub fn is_loading(&self) -> bool {
        self.pending_texture.is_some()
    }

    /// Stop rendering and release everything. Dropping the handle does the same.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if !self.attached && self.scene.is_empty() && self.loader.is_none() {
            return;
        }
        self.render_loop.stop();
        self.pending_texture = None;
        self.unreported_error = None;
        self.loader = None;
        self.clear_geometry();
        self.scene.clear();
        if self.attached {
            self.backend.detach();
            self.attached = false;
        }
        log::info!("Viewport unmounted after {} frames", self.render_loop.frames());
    }
}

impl<B: RenderBackend, S: FrameScheduler> Drop for ViewportHandle<B, S> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests;
