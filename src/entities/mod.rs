pub mod contest_allocations;
pub mod contests;
pub mod draws;
pub mod participants;
pub mod prizes;
pub mod winners;

pub use contest_allocations as contest_allocation_entity;
pub use contests as contest_entity;
pub use draws as draw_entity;
pub use participants as participant_entity;
pub use prizes as prize_entity;
pub use winners as winner_entity;

pub use draws::DrawMode;
pub use winners::PrizeStatus;
