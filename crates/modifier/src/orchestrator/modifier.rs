use common::api::{MoveDiskRequest, ResizeDiskRequest};
use common::models::constants::REBOOT_TIMEOUT_SECS;
use common::models::{DiskSlot, ModifyRequest, ModifyStage, NetworkInterface, VmLocation};
use common::{Error, Result, VmApi};
use std::sync::Arc;
use tracing::{debug, error, info};

use super::{ModifyOptions, ModifyOutcome, ModifyPlan};
use crate::wait::VmWaiter;

/// 单次编排过程中各步骤产生的数据
#[derive(Default)]
struct StageRun {
    mutated: bool,
    current_disk_size: Option<String>,
    interfaces: Option<Vec<NetworkInterface>>,
}

/// 虚拟机修改编排器
#[derive(Clone)]
pub struct VmModifier {
    api: Arc<dyn VmApi>,
    waiter: VmWaiter,
    options: ModifyOptions,
}

impl VmModifier {
    pub fn new(api: Arc<dyn VmApi>) -> Self {
        Self {
            waiter: VmWaiter::new(api.clone()),
            api,
            options: ModifyOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ModifyOptions) -> Self {
        self.options = options;
        self
    }

    /// 执行一次修改
    ///
    /// 校验失败时不会发出任何远程调用；某一步失败后立即停止，
    /// 返回的 `Error::StepFailed` 中包含失败步骤与已完成的步骤
    pub async fn apply(&self, request: &ModifyRequest) -> Result<ModifyOutcome> {
        let plan = ModifyPlan::from_request(request)?;
        let stages = plan.stages(&self.options);
        info!(
            "开始修改 VM {}: disk={}, move={:?}, size={:?}, reboot={}",
            plan.location, plan.slot, plan.move_disk, plan.new_size, plan.reboot
        );

        let mut run = StageRun::default();
        let mut completed = Vec::with_capacity(stages.len());

        for stage in stages {
            debug!("VM {} 进入步骤 {}", plan.location, stage);
            if let Err(e) = self.run_stage(stage, &plan, &mut run).await {
                error!("VM {} 步骤 {} 失败: {}", plan.location, stage, e);
                return Err(Error::StepFailed {
                    stage,
                    completed,
                    source: Box::new(e),
                });
            }
            completed.push(stage);
        }

        let current_disk_size = run
            .current_disk_size
            .ok_or_else(|| Error::NotFound(format!("磁盘 {} 的当前大小", plan.slot)))?;
        info!(
            "VM {} 修改完成, {} 当前大小 {}",
            plan.location, plan.slot, current_disk_size
        );

        Ok(ModifyOutcome {
            location: plan.location,
            disk: plan.slot,
            current_disk_size,
            completed,
            stage: ModifyStage::Done,
            interfaces: run.interfaces,
        })
    }

    async fn run_stage(&self, stage: ModifyStage, plan: &ModifyPlan, run: &mut StageRun) -> Result<()> {
        let vm = &plan.location;

        match stage {
            ModifyStage::WaitingForUnlock => {
                let settings = self.options.wait_for_unlock.unwrap_or_default();
                // 修改开始后状态查询可能短暂失败
                self.waiter
                    .wait_for_config_unlock(vm, settings, run.mutated)
                    .await?;
            }
            ModifyStage::MovingDisk => {
                if let Some(spec) = &plan.move_disk {
                    let request = MoveDiskRequest {
                        disk: plan.slot.key(),
                        storage: spec.target_storage.clone(),
                        delete: spec.delete_source,
                    };
                    info!(
                        "迁移磁盘: vm={}, disk={}, storage={}, delete={}",
                        vm, request.disk, request.storage, request.delete
                    );
                    let task = self.api.move_disk(vm, &request).await?;
                    run.mutated = true;
                    self.waiter
                        .wait_for_task(vm, &task, self.options.task_timeout)
                        .await?;
                }
            }
            ModifyStage::ResizingDisk => {
                if let Some(size) = &plan.new_size {
                    let request = ResizeDiskRequest {
                        disk: plan.slot.key(),
                        size: size.clone(),
                    };
                    info!("调整磁盘大小: vm={}, disk={}, size={}", vm, request.disk, request.size);
                    self.api.resize_disk(vm, &request).await?;
                    run.mutated = true;
                }
            }
            ModifyStage::Rebooting => {
                info!("重启虚拟机: vm={}", vm);
                let task = self.api.reboot_vm(vm, REBOOT_TIMEOUT_SECS).await?;
                run.mutated = true;
                self.waiter
                    .wait_for_task(vm, &task, self.options.task_timeout)
                    .await?;
            }
            ModifyStage::WaitingForAgent => {
                let settings = self.options.agent_network.unwrap_or_default();
                run.interfaces = Some(self.waiter.wait_for_network_interfaces(vm, settings).await?);
            }
            ModifyStage::ReadBack => {
                run.current_disk_size = Some(self.read_disk_size(vm, &plan.slot).await?);
            }
            ModifyStage::Idle | ModifyStage::Done => {}
        }

        Ok(())
    }

    /// 回读指定磁盘的当前大小
    pub async fn read_disk_size(&self, vm: &VmLocation, slot: &DiskSlot) -> Result<String> {
        let config = self.api.get_vm_config(vm).await?;
        let disk = config
            .disk(slot)
            .ok_or_else(|| Error::NotFound(format!("VM {} 的磁盘 {}", vm, slot)))?;
        let size = disk
            .size
            .clone()
            .ok_or_else(|| Error::NotFound(format!("VM {} 磁盘 {} 的大小", vm, slot)))?;

        debug!("VM {} 磁盘 {} 当前大小 {}", vm, slot, size);
        Ok(size)
    }
}
