//! Domain types and models

pub mod auth;
pub mod lenient;
pub mod records;
pub mod role;
pub mod session;
pub mod user;

pub use auth::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest,
    RegisterResponse,
};
pub use records::{
    list_from_response, AssignRequest, Assignment, NewReply, NewTicket, Reply, Tenant, Ticket,
};
pub use role::Role;
pub use session::{SessionSnapshot, SessionStatus};
pub use user::{ProfilePayload, User};
