pub mod guard;
pub mod response;
pub mod session;

pub use guard::{evaluate, route_guard_middleware, GuardOutcome, RouteClass, RouteTable};
pub use response::{ApiResponse, ApiResult};
pub use session::{session_middleware, CurrentSession};
