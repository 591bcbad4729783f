//! Edge processing: Sobel derivatives with margin control and the
//! directional edge-intensity diffusion used as the colour target field.
//!
//! Design goals
//! - Keep the derivative kernel identical for depth, IR and colour so
//!   gradients from the three domains are directly comparable.
//! - Leave unconvolvable borders at zero instead of replicating pixels.

pub mod diffusion;
pub mod grad;

pub use diffusion::{diffuse_edges, DiffusedField};
pub use grad::{magnitude, set_margin, sobel_gradients, Grad};
