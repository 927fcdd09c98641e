//! 开奖核心使用的数据访问层。
//!
//! 每个仓储只负责一类数据，所有方法都接收调用方传入的连接或事务，
//! 不持有任何全局状态：
//! - `ParticipantSource` / `PrizeInventory` 只读
//! - `DrawLedger` 是唯一会写入的仓储（开奖、中奖、名额计数器）

pub mod draw_ledger;
pub mod participant_source;
pub mod prize_inventory;

pub use draw_ledger::*;
pub use participant_source::*;
pub use prize_inventory::*;
