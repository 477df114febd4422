//! Service layer.
//!
//! Each service owns the rules for one slice of the platform and sits
//! between the HTTP handlers and the repositories. Services validate
//! input, enforce authorization through [`policy::PolicyEnforcer`], and
//! coordinate the cache and outbound email where a flow needs them.

pub mod auth;
pub mod business;
pub mod category;
pub mod email;
pub mod password;
pub mod policy;
pub mod review;
pub mod session;
pub mod token;
pub mod user;
pub mod verification;

pub use auth::{AuthService, AuthServiceError, SignInInput, UpdatePasswordInput};
pub use business::{BusinessService, BusinessServiceError};
pub use category::{CategoryService, CategoryServiceError};
pub use email::{Mailer, SmtpMailer};
pub use password::{hash_password, validate_password, verify_password, PasswordPolicyError};
pub use policy::PolicyEnforcer;
pub use review::{ReviewService, ReviewServiceError};
pub use session::{SessionService, SessionServiceError};
pub use token::{Claims, TokenService, TokenServiceError};
pub use user::{UserService, UserServiceError};
pub use verification::VerificationService;
