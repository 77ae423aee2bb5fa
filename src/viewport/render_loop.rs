//! Continuous render loop driven by the host's frame scheduler.

use std::sync::Arc;

/// Host primitive that schedules one more frame callback.
pub trait FrameScheduler {
    fn request_frame(&self);
}

impl FrameScheduler for winit::window::Window {
    fn request_frame(&self) {
        self.request_redraw();
    }
}

impl<T: FrameScheduler + ?Sized> FrameScheduler for Arc<T> {
    fn request_frame(&self) {
        (**self).request_frame();
    }
}

/// Requests a new frame after every rendered one until stopped.
pub struct RenderLoop<S: FrameScheduler> {
    scheduler: S,
    running: bool,
    frames: u64,
}

impl<S: FrameScheduler> RenderLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            scheduler,
            running: false,
            frames: 0,
        }
    }

    pub fn start(&mut self) {
        if self.running {
            return;
        }
        self.running = true;
        self.scheduler.request_frame();
    }

    /// Stop requesting frames. Callbacks already scheduled become no-ops.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Call after rendering a frame; schedules the next one while running.
    pub fn frame_done(&mut self) {
        self.frames += 1;
        if self.running {
            self.scheduler.request_frame();
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingScheduler {
        requests: Cell<u32>,
    }

    impl FrameScheduler for CountingScheduler {
        fn request_frame(&self) {
            self.requests.set(self.requests.get() + 1);
        }
    }

    #[test]
    fn test_loop_requests_frames_until_stopped() {
        let mut render_loop = RenderLoop::new(CountingScheduler::default());
        assert!(!render_loop.is_running());

        render_loop.start();
        render_loop.start();
        assert_eq!(render_loop.scheduler().requests.get(), 1);

        render_loop.frame_done();
        render_loop.frame_done();
        assert_eq!(render_loop.scheduler().requests.get(), 3);

        render_loop.stop();
        render_loop.frame_done();
        assert_eq!(render_loop.scheduler().requests.get(), 3);
        assert_eq!(render_loop.frames(), 3);
    }

    #[test]
    fn test_arc_scheduler_forwards() {
        let scheduler = Arc::new(CountingScheduler::default());
        let mut render_loop = RenderLoop::new(Arc::clone(&scheduler));
        render_loop.start();
        assert_eq!(scheduler.requests.get(), 1);
    }
}
