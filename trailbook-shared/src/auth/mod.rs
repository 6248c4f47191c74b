/// Authentication primitives
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: session token generation and validation
/// - [`reset_token`]: password-reset token generation and hashing
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Session Tokens**: HS256 signing with configurable expiration
/// - **Reset Tokens**: 32-byte random tokens, stored only as SHA-256 hashes
/// - **Constant-time Comparison**: all verification uses constant-time operations

pub mod jwt;
pub mod password;
pub mod reset_token;
