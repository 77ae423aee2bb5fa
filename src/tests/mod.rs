//! End-to-end tests across the selector and viewport components.
//!
//! These drive the public component APIs the way a host does, with fake
//! segmentation backends and a recording render backend.
