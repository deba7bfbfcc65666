use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::course::CourseDescriptor;

/// State of one (period, day) cell of an extracted schedule.
///
/// On the wire an absent field is `Pending` (not extracted yet), `null` is a
/// confirmed free period and an object is a course.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DaySlot {
    #[default]
    Pending,
    Free,
    Course(CourseDescriptor),
}

impl DaySlot {
    pub fn is_pending(&self) -> bool {
        matches!(self, DaySlot::Pending)
    }
}

impl Serialize for DaySlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DaySlot::Course(course) => serializer.serialize_some(course),
            DaySlot::Free | DaySlot::Pending => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for DaySlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<CourseDescriptor>::deserialize(deserializer)? {
            Some(course) => DaySlot::Course(course),
            None => DaySlot::Free,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSlots {
    #[serde(default, skip_serializing_if = "DaySlot::is_pending")]
    pub red_day: DaySlot,
    #[serde(default, skip_serializing_if = "DaySlot::is_pending")]
    pub blue_day: DaySlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub teacher_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedSchedule {
    #[serde(default)]
    pub first_period: PeriodSlots,
    #[serde(default)]
    pub second_period: PeriodSlots,
    #[serde(default)]
    pub third_period: PeriodSlots,
    #[serde(default)]
    pub fourth_period: PeriodSlots,
    #[serde(default)]
    pub advisory: Option<Advisory>,
}

const PERIOD_FIELDS: [&str; 4] = ["firstPeriod", "secondPeriod", "thirdPeriod", "fourthPeriod"];

impl ExtractedSchedule {
    /// Periods 1 through 4 in order.
    pub fn periods(&self) -> [(i64, &PeriodSlots); 4] {
        [
            (1, &self.first_period),
            (2, &self.second_period),
            (3, &self.third_period),
            (4, &self.fourth_period),
        ]
    }

    pub fn period_mut(&mut self, period: i64) -> Option<&mut PeriodSlots> {
        match period {
            1 => Some(&mut self.first_period),
            2 => Some(&mut self.second_period),
            3 => Some(&mut self.third_period),
            4 => Some(&mut self.fourth_period),
            _ => None,
        }
    }

    /// Paths of the cells that have not been extracted yet, e.g. `secondPeriod.blueDay`.
    pub fn pending_slots(&self) -> Vec<String> {
        let mut pending = Vec::new();
        for (field, (_, slots)) in PERIOD_FIELDS.iter().zip(self.periods()) {
            if slots.red_day.is_pending() {
                pending.push(format!("{field}.redDay"));
            }
            if slots.blue_day.is_pending() {
                pending.push(format!("{field}.blueDay"));
            }
        }
        pending
    }
}
