use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

pub type WorkTypeId = i32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WorkType {
    pub id: WorkTypeId,
    pub name: String,
    pub short_name: String,
    pub color: String,
    /// Fraction of a leave day consumed by one entry of this type.
    pub deduction: f64,
    /// Whether a day of this type counts as worked.
    pub is_working_day: bool,
    pub sort_order: i32,
}

/// Standard catalog: name, short label, color, deduction, counts as worked, order.
pub const STANDARD_WORK_TYPES: &[(&str, &str, &str, f64, bool, i32)] = &[
    ("Normal work", "F", "#FFFFFF", 0.0, true, 1),
    ("Day off", "OFF", "#E0E0E0", 0.0, false, 2),
    ("Annual leave", "AL", "#FFD700", 1.0, false, 3),
    ("Morning half-day", "F-AM", "#87CEEB", 0.5, true, 4),
    ("Afternoon half-day", "F-PM", "#87CEEB", 0.5, true, 5),
    ("Quarter-day", "F-Q", "#E6E6FA", 0.25, true, 6),
    ("Sick leave", "SICK", "#FFB6C1", 0.0, false, 7),
    ("Official leave", "OL", "#90EE90", 0.0, true, 8),
    ("Training/Business trip", "TRN", "#98FB98", 0.0, true, 9),
    ("Absence", "ABS", "#FF6347", 0.0, false, 10),
];
