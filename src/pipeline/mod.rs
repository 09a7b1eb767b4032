pub mod camera;
pub mod rgba_converter;

pub use camera::{CameraDevice, FrameSource, available_cameras};
