//! Core value model for the ARC grid-program synthesis engine.
//!
//! This crate has no engine logic: it defines the tagged `Value` union the
//! stack machine pushes and pops, the `Grid`/`Mask` shapes primitives
//! manipulate, and the handful of small product types (`IntPair`, `Nesw`)
//! rounding out the value variants. Everything that *does* something
//! with these values — the primitive catalogue, the VM, the search —
//! lives in `arc_synth_runtime` and `arc_synth_search`.

pub mod grid;
pub mod value;

pub use grid::{Grid, GridError, IntPair, Mask, Nesw, MAX_COLOR};
pub use value::{FunctionHandle, Type, Value};
