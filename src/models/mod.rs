pub mod course;
pub mod extracted;
pub mod schedule;
pub mod user;

pub use course::{Course, CourseDescriptor};
pub use extracted::{Advisory, DaySlot, ExtractedSchedule, PeriodSlots};
pub use schedule::{DayType, Enrollment, EnrollmentDetail, Schedule, ADVISORY_PERIOD};
pub use user::{Classmate, ClassmateRow, NewUserRequest, User};
