//! Modelos de datos
//!
//! Entidades persistidas y valores de entrada/salida del motor de transiciones.

pub mod status;
pub mod vehicle;

pub use status::*;
pub use vehicle::Vehicle;
