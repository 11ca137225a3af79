//! Concrete modules: consumers of the reconciliation core.

pub mod command;
pub mod files;
pub mod fish;
pub mod pacman;
pub mod vscode;

pub use command::CommandModule;
pub use files::FilesModule;
pub use fish::{FishModule, FishStr};
pub use pacman::{PacmanBinary, PacmanModule};
pub use vscode::VscodeModule;
