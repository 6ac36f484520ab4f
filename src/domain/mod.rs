// Domain layer: participant models and ports (interfaces).

pub mod model;
pub mod ports;
