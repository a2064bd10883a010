/// 等待原语
///
/// 任务完成、配置解锁、运行状态、客户机代理网卡，全部基于 `poller::poll_until`

mod agent;
mod task;
mod vm;

use common::VmApi;
use std::sync::Arc;
use std::time::Duration;

/// 任务状态的轮询间隔
pub const TASK_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// 虚拟机等待器
#[derive(Clone)]
pub struct VmWaiter {
    api: Arc<dyn VmApi>,
}

impl VmWaiter {
    pub fn new(api: Arc<dyn VmApi>) -> Self {
        Self { api }
    }
}
