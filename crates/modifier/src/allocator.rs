/// VM ID 分配器
///
/// 从 100 开始逐个候选，只要任一节点能查到该 ID 的状态就视为占用，
/// 跳过 5 个后重试；所有节点都查询失败的第一个候选即为可用 ID

use common::models::constants::{FIRST_VM_ID, MAX_VM_ID, VM_ID_STRIDE};
use common::models::VmLocation;
use common::{Error, Result, VmApi};
use std::sync::Arc;
use tracing::{debug, info};

pub struct VmIdAllocator {
    api: Arc<dyn VmApi>,
}

impl VmIdAllocator {
    pub fn new(api: Arc<dyn VmApi>) -> Self {
        Self { api }
    }

    /// 获取下一个可用的 VM ID
    pub async fn next_id(&self) -> Result<u32> {
        let nodes = self.api.list_nodes().await?;
        let mut candidate = FIRST_VM_ID;

        'candidates: while candidate <= MAX_VM_ID {
            for node in &nodes {
                let vm = VmLocation::new(node.name.clone(), candidate);
                if self.api.get_vm_status(&vm).await.is_ok() {
                    debug!("VM ID {} 已被节点 {} 占用", candidate, node.name);
                    candidate += VM_ID_STRIDE;
                    continue 'candidates;
                }
            }

            info!("分配 VM ID: {}", candidate);
            return Ok(candidate);
        }

        Err(Error::AllocationExhausted)
    }
}
