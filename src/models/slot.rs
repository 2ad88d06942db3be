use serde::Serialize;

/// Canonical daily slot menu. 13:00 is deliberately not offered (lunch hour).
/// This is the single source of truth consumed by the allocator, the
/// availability projections, and input validation.
pub const TIME_SLOTS: [&str; 9] = [
    "08:00", "09:00", "10:00", "11:00", "12:00", "14:00", "15:00", "16:00", "17:00",
];

pub fn is_recognized_slot(time: &str) -> bool {
    TIME_SLOTS.contains(&time)
}

/// Raw slot entry as stored. At most one of `booked_by`/`blocked_by` is set;
/// an entry whose last reference is cleared is deleted rather than kept empty.
#[derive(Debug, Clone)]
pub struct SlotEntry {
    pub time: String,
    pub booked_by: Option<String>,
    pub blocked_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum SlotStatus {
    Available,
    Booked {
        #[serde(rename = "bookedBy")]
        booked_by: String,
    },
    Blocked {
        #[serde(rename = "blockedBy")]
        blocked_by: String,
    },
}

/// One line of the per-date availability projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotView {
    pub time: String,
    #[serde(flatten)]
    pub status: SlotStatus,
}

impl SlotEntry {
    pub fn status(&self) -> SlotStatus {
        if let Some(blocked_by) = &self.blocked_by {
            return SlotStatus::Blocked {
                blocked_by: blocked_by.clone(),
            };
        }
        if let Some(booked_by) = &self.booked_by {
            return SlotStatus::Booked {
                booked_by: booked_by.clone(),
            };
        }
        SlotStatus::Available
    }
}
