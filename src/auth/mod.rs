pub mod claims;
pub mod jwt;

pub use jwt::validate_jwt;
#[cfg(test)]
pub use jwt::issue_jwt;
