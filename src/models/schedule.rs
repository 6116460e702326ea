use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::{PersonId, Verdict, WorkTypeId};

/// Verified attendance after this local hour is late.
pub const LATE_CUTOFF_HOUR: u32 = 9;

pub fn is_after_cutoff(time: NaiveTime) -> bool {
    time > NaiveTime::from_hms_opt(LATE_CUTOFF_HOUR, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// One person's record for one day. (person_id, date) is unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ScheduleEntry {
    pub id: i32,
    pub person_id: PersonId,
    pub date: NaiveDate,
    pub work_type_id: Option<WorkTypeId>,
    pub proof_image: Option<String>,
    pub proof_sha256: Option<String>,
    pub captured_at: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub is_late: bool,
    pub is_absent: bool,
    pub memo: String,
    pub updated_at: DateTime<Utc>,
}

/// Reference to a stored proof image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProof {
    pub key: String,
    pub sha256: String,
}

/// Fields written onto an entry by a proof upload.
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationRecord {
    pub proof: StoredProof,
    pub captured_at: Option<DateTime<Utc>>,
    pub is_verified: bool,
    pub is_late: bool,
}

impl VerificationRecord {
    /// Derives the entry flags from a verdict. `absent` is never touched here.
    pub fn derive(verdict: &Verdict, proof: StoredProof) -> Self {
        let is_verified = verdict.is_verified();
        let is_late = is_verified
            && verdict
                .detected_time
                .map(|t| is_after_cutoff(t.time()))
                .unwrap_or(false);

        Self {
            proof,
            captured_at: verdict.detected_time.map(|t| t.with_timezone(&Utc)),
            is_verified,
            is_late,
        }
    }
}

/// Explicit edits of an entry's flags and memo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct EntryAnnotation {
    pub is_absent: Option<bool>,
    pub memo: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn proof() -> StoredProof {
        StoredProof {
            key: "2026/10/19/1.png".to_string(),
            sha256: "ab".to_string(),
        }
    }

    fn at(h: u32, m: u32) -> Option<DateTime<FixedOffset>> {
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        Some(kst.with_ymd_and_hms(2026, 10, 19, h, m, 0).unwrap())
    }

    #[test]
    fn on_time_verified_entry_is_not_late() {
        let verdict = Verdict { is_valid_time: true, detected_time: at(8, 55), is_security_violation: false };
        let record = VerificationRecord::derive(&verdict, proof());
        assert!(record.is_verified);
        assert!(!record.is_late);
    }

    #[test]
    fn exactly_nine_is_not_late_but_a_minute_after_is() {
        let nine = Verdict { is_valid_time: true, detected_time: at(9, 0), is_security_violation: false };
        assert!(!VerificationRecord::derive(&nine, proof()).is_late);

        let after = Verdict { is_valid_time: true, detected_time: at(9, 1), is_security_violation: false };
        assert!(VerificationRecord::derive(&after, proof()).is_late);
    }

    #[test]
    fn violation_blocks_verification_and_lateness() {
        let verdict = Verdict { is_valid_time: true, detected_time: at(10, 0), is_security_violation: true };
        let record = VerificationRecord::derive(&verdict, proof());
        assert!(!record.is_verified);
        assert!(!record.is_late);
    }

    #[test]
    fn captured_time_is_stored_in_utc() {
        let verdict = Verdict { is_valid_time: true, detected_time: at(8, 30), is_security_violation: false };
        let record = VerificationRecord::derive(&verdict, proof());
        assert_eq!(record.captured_at, Some(Utc.with_ymd_and_hms(2026, 10, 18, 23, 30, 0).unwrap()));
    }
}
