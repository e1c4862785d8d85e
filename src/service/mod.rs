// elevd — Service Module
//
// Unix domain socket transport carrying the command protocol between the
// unprivileged controller and the dispatcher. Framing and peer logging
// live here; command semantics stay in `dispatch`.

mod caller;
mod protocol;
mod uds;

pub use caller::CallerInfo;
pub use protocol::{HelperRequest, HelperResponse};
pub use uds::HelperService;
