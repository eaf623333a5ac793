// Billing: amount derivation, input validation, persistence and the HTTP surface.
// The amount engine is pure; handlers own logging and the spawn_blocking hops into layout.

pub mod amounts;
pub mod handlers;
pub mod store;
pub mod validation;
