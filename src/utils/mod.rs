pub mod math;
pub mod vector3d;
