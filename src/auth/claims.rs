use serde::{Deserialize, Serialize};

use crate::models::PersonId;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String, // Person id
    pub exp: i64,    // Expiration timestamp
    pub iat: i64,    // Issued at timestamp
}

impl SessionClaims {
    pub fn person_id(&self) -> Result<PersonId, String> {
        self.sub
            .parse()
            .map_err(|_| format!("Invalid subject in token: {}", self.sub))
    }
}
