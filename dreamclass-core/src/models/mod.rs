mod calendar_event;
mod class_data;
mod class_note;
mod event_kind;
mod student;

pub use calendar_event::CalendarEvent;
pub use class_data::ClassData;
pub use class_note::ClassNote;
pub use event_kind::EventKind;
pub use student::Student;
