//! SurrealDB repository implementations.

mod oauth2_client;
mod permission;
mod session;
mod user;

pub use oauth2_client::SurrealOAuth2ClientRepository;
pub use permission::SurrealPermissionRepository;
pub use session::SurrealSessionRepository;
pub use user::SurrealUserRepository;
