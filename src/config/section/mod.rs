//! Configuration section definitions.
//!
//! Each module corresponds to a section in `bundle.toml`:
//!
//! | Module     | TOML Section   | Purpose                                  |
//! |------------|----------------|------------------------------------------|
//! | `compress` | `[compress]`   | What to combine, methods, duplicates     |
//! | `paths`    | `[paths]`      | Web root, output, bundle store, context  |
//! | `serve`    | `[serve]`      | Bundle server                            |

mod compress;
mod paths;
mod serve;

pub use compress::{CompressMethod, CompressSettings};
pub use paths::PathsConfig;
pub use serve::ServeConfig;
