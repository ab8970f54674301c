use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NluError;
use crate::models::{EntityRef, Intent, Slot, SlotSet, Visibility};

/// Slots accumulated across the turns of one conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TripData {
    pub resort: Option<EntityRef>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration_days: Option<u32>,
    pub visibility: Option<Visibility>,
    pub party_size: Option<u32>,
}

/// Values resolved from a single turn. `None` means "not mentioned".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotUpdate {
    pub resort: Option<EntityRef>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub duration_days: Option<u32>,
    pub visibility: Option<Visibility>,
    pub party_size: Option<u32>,
}

impl SlotUpdate {
    /// Only confident slots make it into an update; an ambiguous resort is
    /// never attached to the intent in the first place.
    pub fn from_intent(intent: &Intent) -> Self {
        Self {
            resort: intent
                .resort
                .as_ref()
                .filter(|resort| resort.confidence.is_confident())
                .map(|resort| resort.to_ref()),
            start_date: intent.start_date.map(|parsed| parsed.date),
            end_date: intent.end_date.map(|parsed| parsed.date),
            duration_days: intent.duration_days,
            visibility: intent.visibility,
            party_size: intent.party_size,
        }
    }

    pub fn has_schedule(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some() || self.duration_days.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.resort.is_none()
            && !self.has_schedule()
            && self.visibility.is_none()
            && self.party_size.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeOutcome {
    /// Set when the turn replaced an already chosen resort.
    pub previous_resort: Option<EntityRef>,
    /// The turn's dates would have put the end before the start and were dropped.
    pub range_rejected: bool,
}

impl MergeOutcome {
    pub fn resort_changed(&self) -> bool {
        self.previous_resort.is_some()
    }
}

impl TripData {
    /// Folds one turn into the accumulator. Slots the turn does not mention
    /// are kept; a different resort invalidates the old schedule before this
    /// turn's own dates are applied.
    pub fn merge(&mut self, update: SlotUpdate) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        if let Some(resort) = update.resort {
            let same = self
                .resort
                .as_ref()
                .is_some_and(|current| current.id == resort.id);
            if !same {
                if self.resort.is_some() {
                    outcome.previous_resort = self.resort.take();
                    self.clear_schedule();
                }
                self.resort = Some(resort);
            }
        }

        let before = (self.start_date, self.end_date, self.duration_days);

        if let Some(start) = update.start_date {
            self.start_date = Some(start);
        }
        match (update.end_date, update.duration_days) {
            (Some(end), _) => {
                self.end_date = Some(end);
                self.duration_days = None;
            }
            (None, Some(days)) => {
                self.duration_days = Some(days);
                self.end_date = None;
            }
            (None, None) => {
                if update.start_date.is_some() && self.duration_days.is_some() {
                    self.end_date = None;
                }
            }
        }

        if !self.reconcile() {
            (self.start_date, self.end_date, self.duration_days) = before;
            outcome.range_rejected = true;
        }

        if let Some(visibility) = update.visibility {
            self.visibility = Some(visibility);
        }
        if let Some(party_size) = update.party_size {
            self.party_size = Some(party_size);
        }

        outcome
    }

    /// Derives whichever of end date / duration is missing. Durations are
    /// inclusive: 3/20 to 3/25 is six days. Returns `false` when the end
    /// precedes the start.
    pub fn reconcile(&mut self) -> bool {
        match (self.start_date, self.end_date, self.duration_days) {
            (Some(start), Some(end), _) => {
                if end < start {
                    return false;
                }
                self.duration_days = u32::try_from((end - start).num_days() + 1).ok();
            }
            (Some(start), None, Some(days)) => {
                self.end_date = Some(start + Duration::days(i64::from(days.max(1)) - 1));
            }
            _ => {}
        }
        true
    }

    pub fn clear_schedule(&mut self) {
        self.start_date = None;
        self.end_date = None;
        self.duration_days = None;
    }

    /// Required slots still empty; `Slot::Duration` stands for "end date or
    /// duration".
    pub fn missing(&self) -> SlotSet {
        let mut missing = SlotSet::empty();
        if self.resort.is_none() {
            missing.insert(Slot::Resort);
        }
        if self.start_date.is_none() {
            missing.insert(Slot::StartDate);
        }
        if self.end_date.is_none() && self.duration_days.is_none() {
            missing.insert(Slot::Duration);
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// A fully specified trip, ready for the trip store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTrip {
    pub resort: EntityRef,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: u32,
    pub visibility: Visibility,
    pub party_size: Option<u32>,
}

impl TryFrom<&TripData> for NewTrip {
    type Error = NluError;

    fn try_from(trip: &TripData) -> Result<Self, Self::Error> {
        let mut trip = trip.clone();
        trip.reconcile();
        let missing = |slot| NluError::MissingRequiredSlot { slot };

        let resort = trip.resort.clone().ok_or_else(|| missing(Slot::Resort))?;
        let start_date = trip.start_date.ok_or_else(|| missing(Slot::StartDate))?;
        let end_date = trip.end_date.ok_or_else(|| missing(Slot::Duration))?;
        let duration_days = trip.duration_days.ok_or_else(|| missing(Slot::Duration))?;

        Ok(Self {
            resort,
            start_date,
            end_date,
            duration_days,
            visibility: trip.visibility.unwrap_or(Visibility::Private),
            party_size: trip.party_size,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    pub trip_id: String,
    pub resort_id: String,
    pub resort_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: u32,
    pub visibility: Visibility,
    pub party_size: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl TripRecord {
    pub fn from_new(trip_id: String, trip: NewTrip, created_at: DateTime<Utc>) -> Self {
        Self {
            trip_id,
            resort_id: trip.resort.id,
            resort_name: trip.resort.name,
            start_date: trip.start_date,
            end_date: trip.end_date,
            duration_days: trip.duration_days,
            visibility: trip.visibility,
            party_size: trip.party_size,
            created_at,
        }
    }
}
