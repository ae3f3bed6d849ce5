//! Initial lighting of freshly generated cubes.

mod first_light;

pub use first_light::FirstLightProcessor;
