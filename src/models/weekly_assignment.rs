//! Weekly assignment (equipment/operator binding) model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::enums::{BindingStatus, Shift};
use crate::{
    repository::{Collection, Document},
    rules::availability::{Binding, RangeError, TimeRange},
};

/// Binds one equipment unit to one operator for a range of days
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WeeklyAssignment {
    pub id: String,
    pub operator_id: String,
    pub equipment_id: String,
    /// First day covered
    pub start_date: NaiveDate,
    /// Last day covered (inclusive)
    pub end_date: NaiveDate,
    pub shift: Shift,
    pub status: BindingStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeeklyAssignment {
    /// Covered days as a half-open range `[start_date, end_date + 1)`
    pub fn day_range(&self) -> Result<TimeRange<NaiveDate>, RangeError> {
        TimeRange::from_inclusive_days(self.start_date, self.end_date)
    }
}

impl Document for WeeklyAssignment {
    const COLLECTION: Collection = Collection::WeeklyAssignments;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Binding<NaiveDate> for WeeklyAssignment {
    fn binding_id(&self) -> &str {
        &self.id
    }

    fn equipment_id(&self) -> Option<&str> {
        Some(&self.equipment_id)
    }

    fn is_active(&self) -> bool {
        self.status == BindingStatus::Active
    }

    fn range(&self) -> Option<TimeRange<NaiveDate>> {
        self.day_range().ok()
    }
}

/// Create weekly assignment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWeeklyAssignment {
    pub operator_id: String,
    pub equipment_id: String,
    /// Start date (YYYY-MM-DD)
    pub start_date: NaiveDate,
    /// End date, inclusive (YYYY-MM-DD)
    pub end_date: NaiveDate,
    pub shift: Shift,
    pub notes: Option<String>,
}

/// Update weekly assignment request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateWeeklyAssignment {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub shift: Option<Shift>,
    pub notes: Option<String>,
}

/// Query parameters for listing weekly assignments
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct WeeklyAssignmentQuery {
    pub equipment_id: Option<String>,
    pub operator_id: Option<String>,
    pub status: Option<BindingStatus>,
    /// Only bindings ending on or after this day
    pub from: Option<NaiveDate>,
    /// Only bindings starting on or before this day
    pub to: Option<NaiveDate>,
}
