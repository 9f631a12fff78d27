//! CLI commands implementation

pub mod add;
pub mod chart;
pub mod check;
pub mod init;
pub mod products;
pub mod watch;

pub use add::*;
pub use chart::*;
pub use check::*;
pub use init::*;
pub use products::*;
pub use watch::*;
