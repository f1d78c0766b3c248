pub mod aerodynamics;
pub mod kinematics;
pub mod orbit;
pub mod pitchover;
