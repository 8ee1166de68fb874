// Domain layer: tables, field resolution, region rules and geo enrichment.

pub mod fields;
pub mod geo;
pub mod model;
pub mod ports;
pub mod region;
pub mod sample;
