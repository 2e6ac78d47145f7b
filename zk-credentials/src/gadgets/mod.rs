//! Reusable constraint primitives.
//!
//! Everything here comes in two flavors that MUST agree: a native function
//! used by the host to compute expected public outputs, and an R1CS gadget
//! enforcing the same computation in-circuit.

pub mod compare;
pub mod hash;
pub mod merkle;
pub mod set;
pub mod signature;
