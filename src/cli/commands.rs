// elevd — CLI Command Handlers
//
// Each function handles one subcommand. `serve` wires a POSIX backend into
// the dispatcher and hands both to the UDS service; the diagnostic
// subcommands call the backend directly and print to stdout.

use std::sync::Arc;

use crate::dispatch::Dispatcher;
use crate::os::{OsBackend, PosixBackend, PID_NOT_FOUND};
use crate::service::HelperService;

use super::Commands;

/// Execute the parsed CLI command.
pub async fn execute(command: Commands) -> crate::Result<()> {
    match command {
        Commands::Serve { socket } => cmd_serve(socket).await,
        Commands::FindProcess { name } => cmd_find_process(&name),
        Commands::ParentPid { pid } => cmd_parent_pid(pid),
        Commands::OwnerOfEndpoint { local, remote } => cmd_owner_of_endpoint(local, remote),
        Commands::TorCookiePaths { path, username } => cmd_tor_cookie_paths(&path, &username),
    }
}

async fn cmd_serve(socket: Option<std::path::PathBuf>) -> crate::Result<()> {
    let socket_path = socket.unwrap_or_else(HelperService::default_socket_path);
    let dispatcher = Dispatcher::new(Arc::new(PosixBackend::new()));
    HelperService::new(dispatcher, socket_path).run().await
}

fn print_pid(pid: Option<u32>) {
    match pid {
        Some(pid) => println!("{pid}"),
        None => println!("{PID_NOT_FOUND}"),
    }
}

fn cmd_find_process(name: &str) -> crate::Result<()> {
    let backend = PosixBackend::new();
    print_pid(backend.pid_of_name(name)?);
    Ok(())
}

fn cmd_parent_pid(pid: Option<u32>) -> crate::Result<()> {
    let backend = PosixBackend::new();
    match pid {
        Some(pid) => print_pid(backend.parent_pid_of(pid)?),
        None => print_pid(Some(backend.self_parent_pid()?)),
    }
    Ok(())
}

fn cmd_owner_of_endpoint(
    local: std::net::SocketAddr,
    remote: std::net::SocketAddr,
) -> crate::Result<()> {
    let backend = PosixBackend::new();
    print_pid(backend.pid_matching_endpoints(local, remote)?);
    Ok(())
}

fn cmd_tor_cookie_paths(path: &str, username: &str) -> crate::Result<()> {
    let backend = PosixBackend::new();
    for candidate in backend.tor_cookie_paths(path, username) {
        println!("{}", candidate.display());
    }
    Ok(())
}
