/// Authentication utilities
///
/// This module provides the authentication primitives for TaskCrew:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength checks
/// - [`jwt`]: JWT session token generation and validation
/// - [`middleware`]: Axum middleware extracting the token from the session
///   cookie or the Authorization header
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **JWT Tokens**: HS256 signing, 24 hour expiration
/// - **Constant-time Comparison**: Password verification uses constant-time
///   operations
///
/// # Example
///
/// ```
/// use taskcrew_shared::auth::password::{hash_password, verify_password};
/// use taskcrew_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), false);
/// let token = create_token(&claims, "secret-key-that-is-32-bytes-long!")?;
/// let validated = validate_token(&token, "secret-key-that-is-32-bytes-long!")?;
/// assert_eq!(validated.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
