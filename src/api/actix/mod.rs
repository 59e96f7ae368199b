mod middleware;

pub use middleware::{Shield, ShieldMiddleware};
