/// PVE VM Modify - 公共库
///
/// 提供客户端与编排器共享的数据模型、错误类型、远程 API 抽象等

pub mod api;
pub mod errors;
pub mod models;
pub mod utils;

// 重新导出常用类型
pub use api::VmApi;
pub use errors::{Error, Result};
pub use models::{DiskBus, DiskSlot, ModifyStage, TaskRef, VmLocation};
