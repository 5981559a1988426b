// MODEL: camera math and scene description
pub mod camera;
pub mod primitive;

pub use camera::{Basis, CameraState, Orientation, Projection};
pub use primitive::{Drawable, Primitive, Transform};
