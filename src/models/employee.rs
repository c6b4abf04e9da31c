use serde::{Deserialize, Serialize};

/// A barber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Employee {
    pub id: String,
    pub name: String,
    /// E.164 number used for booking notifications and the SCHEDULE command.
    pub phone: Option<String>,
    pub bio: Option<String>,
}
