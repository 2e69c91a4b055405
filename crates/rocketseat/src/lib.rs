mod catalog;
mod client;
mod model;
mod session;

pub use catalog::*;
pub use client::*;
pub use model::*;
pub use session::*;
