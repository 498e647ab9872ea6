use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session token payload. Serialized field names match the tokens issued by the mobile
/// backend (`userId`, `iat`, `exp`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: Uuid, // user ID
    pub iat: usize,    // issued at (unix timestamp)
    pub exp: usize,    // expires at (unix timestamp)
}
