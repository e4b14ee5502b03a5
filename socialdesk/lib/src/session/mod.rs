//! Session models, persistence and lifecycle.

mod model;
mod owner;
mod store;

pub use model::{AuthModel, LoginResponse, Lookup, SessionTokens, UserModel};
pub use owner::SessionOwner;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
