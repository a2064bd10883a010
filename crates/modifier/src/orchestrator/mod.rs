/// 虚拟机重配置编排
///
/// 迁移磁盘 -> 扩容磁盘 -> 重启 -> 回读磁盘大小，严格顺序执行，任一步失败即停止

mod modifier;
mod plan;

pub use modifier::VmModifier;
pub use plan::ModifyPlan;

use common::models::{DiskSlot, ModifyStage, NetworkInterface, VmLocation};
use serde::Serialize;
use std::time::Duration;

use crate::poller::PollSettings;

/// 编排选项，默认全部关闭
#[derive(Debug, Clone, Default)]
pub struct ModifyOptions {
    /// 第一次修改前与最后一次修改后等待配置解锁
    pub wait_for_unlock: Option<PollSettings>,
    /// 重启后等待客户机代理上报网卡
    pub agent_network: Option<PollSettings>,
    /// 任务等待上限，None 表示一直等到任务结束
    pub task_timeout: Option<Duration>,
}

/// 编排结果
#[derive(Debug, Clone, Serialize)]
pub struct ModifyOutcome {
    pub location: VmLocation,
    pub disk: DiskSlot,
    pub current_disk_size: String,
    pub completed: Vec<ModifyStage>,
    pub stage: ModifyStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<NetworkInterface>>,
}
