pub mod evaluator;

pub use evaluator::{authorize, AuthorizationError, Decision};
