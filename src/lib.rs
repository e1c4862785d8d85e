// elevd — Library root
//
// Privilege-separated command executor: the elevated helper that performs
// process introspection, socket-to-process correlation, and credential
// cookie discovery on behalf of an unprivileged controller, reached
// through a narrow command protocol.

pub mod cli;
pub mod dispatch;
pub mod error;
pub mod os;
pub mod service;

pub use error::{ElevdError, Result};
