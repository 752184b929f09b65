//! Map rendering: braille canvas, arc curves, scene assembly, and the
//! interactive view loop.

pub mod canvas;
pub mod curve;
pub mod scene;
pub mod view;

pub use view::run;
