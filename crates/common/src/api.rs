/// 远程操作客户端抽象
///
/// 编排器只通过该 Trait 访问虚拟化管理 API，便于替换实现与测试

use async_trait::async_trait;
use serde::Serialize;

use crate::models::{
    NetworkInterface, NodeInfo, TaskRef, TaskStatus, VmConfig, VmLocation, VmStatusSnapshot,
};
use crate::Result;

/// 磁盘迁移请求体
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MoveDiskRequest {
    pub disk: String,
    pub storage: String,
    pub delete: bool,
}

/// 磁盘扩容请求体
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ResizeDiskRequest {
    pub disk: String,
    pub size: String,
}

/// 远程操作客户端 Trait
#[async_trait]
pub trait VmApi: Send + Sync + 'static {
    /// 迁移磁盘到目标存储，返回异步任务引用
    async fn move_disk(&self, vm: &VmLocation, request: &MoveDiskRequest) -> Result<TaskRef>;

    /// 调整磁盘大小（同步生效，无任务引用）
    async fn resize_disk(&self, vm: &VmLocation, request: &ResizeDiskRequest) -> Result<()>;

    /// 重启虚拟机，`timeout_secs` 为远端超时
    async fn reboot_vm(&self, vm: &VmLocation, timeout_secs: u32) -> Result<TaskRef>;

    /// 查询任务状态
    async fn get_task_status(&self, node: &str, task: &TaskRef) -> Result<TaskStatus>;

    /// 查询虚拟机当前状态
    async fn get_vm_status(&self, vm: &VmLocation) -> Result<VmStatusSnapshot>;

    /// 查询虚拟机配置
    async fn get_vm_config(&self, vm: &VmLocation) -> Result<VmConfig>;

    /// 查询客户机代理上报的网卡
    async fn get_agent_network_interfaces(&self, vm: &VmLocation) -> Result<Vec<NetworkInterface>>;

    /// 列出集群节点
    async fn list_nodes(&self) -> Result<Vec<NodeInfo>>;
}
