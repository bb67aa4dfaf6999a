use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to record a swipe on a pet
///
/// The pet id comes from the path; the type is parsed case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct InteractRequest {
    #[validate(length(min = 1))]
    #[serde(rename = "type", alias = "interactionType")]
    pub interaction_type: String,
}
