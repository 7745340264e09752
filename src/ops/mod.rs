pub mod dispatcher;
pub mod handler;

pub use dispatcher::{DispatchError, InvocationState, OperationDispatcher};
pub use handler::{HandlerFailure, HandlerRegistry, OperationHandler};
