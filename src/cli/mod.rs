// elevd — CLI Module
//
// Command-line interface using clap derive macros. `serve` runs the UDS
// service; the remaining subcommands exercise the OS backend directly,
// which is handy when diagnosing an installed helper.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::execute;

/// elevd — privilege-separated helper for process and socket introspection.
#[derive(Parser, Debug)]
#[command(name = "elevd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the command protocol on a Unix domain socket.
    Serve {
        /// Socket path; defaults to `$XDG_RUNTIME_DIR/elevd/elevd.sock`.
        #[arg(long)]
        socket: Option<PathBuf>,
    },

    /// Look up the pid of a process by its command name.
    FindProcess {
        /// Exact command name (OS case convention applies).
        name: String,
    },

    /// Print the parent pid of a process (or of this helper).
    ParentPid {
        /// Target pid; omit to query the helper's own parent.
        pid: Option<u32>,
    },

    /// Resolve the pid owning a socket by its endpoint pair.
    OwnerOfEndpoint {
        /// Local side, e.g. `127.0.0.1:9050`.
        local: std::net::SocketAddr,

        /// Remote side, e.g. `0.0.0.0:0` for a listener.
        remote: std::net::SocketAddr,
    },

    /// Print candidate Tor control-cookie paths, most specific first.
    TorCookiePaths {
        /// Tor install path (the tor executable).
        #[arg(long, default_value = "")]
        path: String,

        /// Acting username for user-scoped candidates.
        #[arg(long, default_value = "")]
        username: String,
    },
}
