//! CLI command implementations.
//!
//! | Module    | Commands handled                                       |
//! |-----------|--------------------------------------------------------|
//! | `browse`  | `Search`, `Catalog`, `Artist`, `Album`, `Register`     |
//! | `shell`   | `Shell` and every command typed inside it              |
//! | `render`  | Text output shared by both                             |

pub mod browse;
pub mod render;
pub mod shell;

pub use browse::{cmd_album, cmd_artist, cmd_catalog, cmd_register, cmd_search};
pub use shell::cmd_shell;
