pub mod classmates;
pub mod course_resolver;
pub mod locks;
pub mod schedule_service;
pub mod upload;

pub use classmates::{ClassmateGroups, find_classmates};
pub use course_resolver::resolve_course;
pub use locks::TeacherLocks;
pub use schedule_service::{ScheduleService, StoredSchedule};
pub use upload::{ProgressEvent, UploadPipeline};
