// Domain layer: styling rules, legend, models and ports. No I/O.

pub mod legend;
pub mod model;
pub mod ports;
pub mod style;
