/// Easy VM Cloud - VM Modifier
///
/// 长耗时虚拟机操作的编排与轮询：磁盘迁移、磁盘扩容、重启，
/// 以及任务完成、配置解锁、运行状态、客户机代理网卡的等待

pub mod allocator;
pub mod config;
pub mod orchestrator;
pub mod poller;
pub mod resource;
pub mod wait;

#[cfg(test)]
mod testing;

pub use allocator::VmIdAllocator;
pub use config::Config;
pub use orchestrator::{ModifyOptions, ModifyOutcome, ModifyPlan, VmModifier};
pub use poller::{poll_until, PollSettings};
pub use resource::{ModifyVmResource, ModifyVmState};
pub use wait::VmWaiter;
