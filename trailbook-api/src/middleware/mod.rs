/// Request middleware
///
/// - [`auth`]: session authentication and role-based authorization
/// - [`security`]: security response headers

pub mod auth;
pub mod security;
