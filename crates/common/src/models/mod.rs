/// 共享数据模型
///
/// 定义远程 API 客户端与编排器共享的数据结构

pub mod disk;
pub mod request;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use disk::{DiskBus, DiskDescriptor, DiskSlot, VmConfig, DISK_BUS_LIMITS};
pub use request::{ModifyRequest, MoveDiskSpec};

/// 虚拟机位置（节点名 + 数字 ID）
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct VmLocation {
    pub node: String,
    pub vm_id: u32,
}

impl VmLocation {
    pub fn new(node: impl Into<String>, vm_id: u32) -> Self {
        Self {
            node: node.into(),
            vm_id,
        }
    }
}

impl fmt::Display for VmLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.node, self.vm_id)
    }
}

/// 异步任务引用 (UPID)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct TaskRef(pub String);

impl TaskRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskRef {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// 任务状态
///
/// 除 "running" 之外的任何值都视为终态，这一层不区分成功与失败
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskStatus {
    pub status: String,
    #[serde(default, rename = "exitstatus", skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<String>,
}

impl TaskStatus {
    pub fn is_running(&self) -> bool {
        self.status == constants::TASK_STATUS_RUNNING
    }
}

/// 虚拟机状态快照，每次轮询都重新获取
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VmStatusSnapshot {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock: Option<String>,
}

impl VmStatusSnapshot {
    /// 配置锁非空表示配置正在被修改
    pub fn is_locked(&self) -> bool {
        self.lock.as_deref().is_some_and(|l| !l.is_empty())
    }
}

/// 客户机代理上报的网卡
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct NetworkInterface {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware_address: Option<String>,
    #[serde(default)]
    pub ip_addresses: Vec<IpAddress>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct IpAddress {
    pub ip_address: String,
    pub ip_address_type: String,
    #[serde(default)]
    pub prefix: u8,
}

/// 集群节点
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeInfo {
    #[serde(rename = "node")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// 编排步骤
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModifyStage {
    Idle,
    WaitingForUnlock,
    MovingDisk,
    ResizingDisk,
    Rebooting,
    WaitingForAgent,
    ReadBack,
    Done,
}

impl ModifyStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModifyStage::Idle => "idle",
            ModifyStage::WaitingForUnlock => "waiting_for_unlock",
            ModifyStage::MovingDisk => "moving_disk",
            ModifyStage::ResizingDisk => "resizing_disk",
            ModifyStage::Rebooting => "rebooting",
            ModifyStage::WaitingForAgent => "waiting_for_agent",
            ModifyStage::ReadBack => "read_back",
            ModifyStage::Done => "done",
        }
    }
}

impl fmt::Display for ModifyStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 常量定义
pub mod constants {
    /// 任务运行中状态值
    pub const TASK_STATUS_RUNNING: &str = "running";

    /// 未设置新磁盘大小时的默认值
    pub const DEFAULT_NEW_DISK_SIZE: &str = "0G";

    /// 默认磁盘总线
    pub const DEFAULT_DISK_BUS: &str = "virtio";

    /// 重启请求的远端超时（秒）
    pub const REBOOT_TIMEOUT_SECS: u32 = 300;

    /// VM ID 分配起点
    pub const FIRST_VM_ID: u32 = 100;

    /// VM ID 分配步长
    pub const VM_ID_STRIDE: u32 = 5;

    /// VM ID 分配上限
    pub const MAX_VM_ID: u32 = 2_147_483_637;
}
