//! Image buffers, raw sensor frames, sampling and file I/O.
pub mod f64;
pub mod frame;
pub mod interp;
pub mod io;
pub mod traits;

pub use self::f64::ImageF64;
pub use self::frame::{luminance_from_yuy2, RawFrame};
pub use self::interp::bilinear;
pub use self::traits::{ImageView, ImageViewMut, Rows};
