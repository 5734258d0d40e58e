pub mod attendee;
pub mod event;
pub mod pagination;

pub use attendee::{Attendee, AttendeeCount, NewAttendee, RegisterAttendeeRequest};
pub use event::{
    CreateEventRequest, Event, EventChanges, EventFilter, EventListQuery, EventQuery,
    EventResponse, EventWithCount, NewEvent, UpdateEventRequest,
};
pub use pagination::{Pagination, PaginationParams};
