//! Account DTOs

use serde::{Deserialize, Serialize};

/// Credit grant from the payment collaborator
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GrantCredits {
    pub credits: i64,
}
