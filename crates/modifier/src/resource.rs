/// 声明式资源生命周期
///
/// 资源 ID 为 "{node}{vm_id}"，删除不会回滚任何修改

use common::models::ModifyRequest;
use common::{Result, VmApi};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::orchestrator::{ModifyOptions, ModifyOutcome, ModifyPlan, VmModifier};

/// 资源状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModifyVmState {
    pub id: String,
    pub request: ModifyRequest,
    pub current_disk_size: String,
}

impl ModifyVmState {
    fn new(request: &ModifyRequest, current_disk_size: String) -> Self {
        Self {
            id: resource_id(request),
            request: request.clone(),
            current_disk_size,
        }
    }
}

fn resource_id(request: &ModifyRequest) -> String {
    format!("{}{}", request.node_name, request.vm_id)
}

pub struct ModifyVmResource {
    modifier: VmModifier,
}

impl ModifyVmResource {
    pub fn new(api: Arc<dyn VmApi>, options: ModifyOptions) -> Self {
        Self {
            modifier: VmModifier::new(api).with_options(options),
        }
    }

    pub async fn create(&self, request: &ModifyRequest) -> Result<ModifyVmState> {
        let outcome = self.modifier.apply(request).await?;
        let state = ModifyVmState::new(request, outcome.current_disk_size);
        info!("资源 {} 已创建", state.id);
        Ok(state)
    }

    /// 只回读磁盘大小
    pub async fn read(&self, state: &ModifyVmState) -> Result<ModifyVmState> {
        let plan = ModifyPlan::from_request(&state.request)?;
        let current_disk_size = self
            .modifier
            .read_disk_size(&plan.location, &plan.slot)
            .await?;

        Ok(ModifyVmState::new(&state.request, current_disk_size))
    }

    /// 请求有变化时重新执行修改，否则只回读
    pub async fn update(&self, previous: &ModifyVmState, desired: &ModifyRequest) -> Result<ModifyVmState> {
        if previous.request == *desired {
            info!("资源 {} 无变化", previous.id);
            let state = ModifyVmState {
                request: desired.clone(),
                ..previous.clone()
            };
            return self.read(&state).await;
        }

        let ModifyOutcome { current_disk_size, .. } = self.modifier.apply(desired).await?;
        let state = ModifyVmState::new(desired, current_disk_size);
        info!("资源 {} 已更新", state.id);
        Ok(state)
    }

    pub async fn delete(&self, state: &ModifyVmState) -> Result<()> {
        info!("资源 {} 已删除（不回滚修改）", state.id);
        Ok(())
    }
}
