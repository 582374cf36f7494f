pub mod account;
pub mod event;

pub use account::AccountService;
pub use event::EventService;
