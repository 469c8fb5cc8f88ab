//! **Private**: `shared` members are only for internal use.
//! Some types are reexposed at the crate root and in `client`.

pub use self::bodykind::BodyKind;
pub use self::charset::Charset;
pub use self::version::Version;

pub mod headers;
mod bodykind;
mod charset;
mod version;
