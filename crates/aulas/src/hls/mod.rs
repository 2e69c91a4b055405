mod playlist;
mod resolver;
mod variant;

pub use m3u8_rs;
pub use playlist::*;
pub use resolver::ManifestResolver;
pub use variant::*;
