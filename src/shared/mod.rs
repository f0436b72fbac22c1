pub mod errors;
pub mod locks;
pub mod shutdown;
pub mod time;

pub use errors::*;
pub use locks::*;
pub use shutdown::*;
pub use time::*;
