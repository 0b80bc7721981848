mod color;
mod corners;
mod cursor;

pub use color::*;
pub use corners::*;
pub use cursor::*;
