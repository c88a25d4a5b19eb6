//! Common infrastructure for the vtoold network configuration library.
//!
//! - [`exec`]: External program execution with captured output and timeouts
//! - [`error`]: Error type shared by every vtoold operation
//! - `testing`: Scripted runner for tests (feature `test-util`)
//!
//! # Example
//!
//! ```ignore
//! use vtool_common::{exec::{self, CommandLine, SystemRunner}, VtoolResult};
//!
//! async fn show_routes(runner: &SystemRunner) -> VtoolResult<String> {
//!     let cmd = CommandLine::new("/sbin/ip").args(["route", "show"]);
//!     exec::run_checked(runner, &cmd).await
//! }
//! ```

pub mod error;
pub mod exec;
#[cfg(feature = "test-util")]
pub mod testing;

// Re-export commonly used items at crate root
pub use error::{ErrorKind, VtoolError, VtoolResult};
pub use exec::{CommandLine, CommandRunner, ExecResult, SystemRunner};
