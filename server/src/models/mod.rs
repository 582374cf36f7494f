pub mod account;
pub mod event;
pub mod page;

pub use account::{Account, AccountId, AccountRef, AccountRole};
pub use event::{Event, EventId, EventInput, EventRequest, EventStatus};
pub use page::{Direction, EventSortField, Page, PageMetadata, PageParams, PageRequest, Sort};
