//! Chart pattern detectors
//!
//! All detectors work on swing points extracted from the high/low arrays.
//!
//! # Detectors
//!
//! - **Double bottom / double top**: one pivot-pair scanner, configured per side
//! - **Head-and-shoulders**: consecutive swing-high triples
//! - **Ascending triangle**: most recent swing-low/high window only

pub mod helpers;
pub mod swing;

/// Generate `with_defaults()` -> `Self::default()` for multiple detector types.
macro_rules! impl_with_defaults {
  ($($detector:ty),* $(,)?) => {
    $(impl $detector {
      pub fn with_defaults() -> Self { Self::default() }
    })*
  };
}

pub mod double;
pub mod head_shoulders;
pub mod triangle;

// Re-export all detectors for convenience
pub use double::*;
pub use head_shoulders::*;
pub use swing::{SwingPoints, SwingSide};
pub use triangle::*;
