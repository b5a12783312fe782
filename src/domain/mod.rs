// Domain layer: certificate models and the capability ports the pipeline calls through.

pub mod model;
pub mod ports;
