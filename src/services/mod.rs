pub mod capacity_accountant;
pub mod draw_service;
pub mod winner_allocator;

pub use capacity_accountant::*;
pub use draw_service::*;
pub use winner_allocator::*;
