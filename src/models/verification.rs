use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Outcome of analyzing one proof image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Verdict {
    pub is_valid_time: bool,
    /// Timestamp read from the image, in the attendance time zone.
    pub detected_time: Option<DateTime<FixedOffset>>,
    pub is_security_violation: bool,
}

impl Verdict {
    /// Verdict for an image that could not be analyzed.
    pub fn fail_closed() -> Self {
        Self {
            is_valid_time: false,
            detected_time: None,
            is_security_violation: true,
        }
    }

    pub fn is_verified(&self) -> bool {
        self.is_valid_time && !self.is_security_violation
    }
}
