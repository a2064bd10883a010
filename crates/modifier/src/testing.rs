/// 测试用的脚本化 VmApi，记录所有远程调用

use async_trait::async_trait;
use common::api::{MoveDiskRequest, ResizeDiskRequest};
use common::models::{
    DiskDescriptor, NetworkInterface, NodeInfo, TaskRef, TaskStatus, VmConfig, VmLocation,
    VmStatusSnapshot,
};
use common::{Error, Result, VmApi};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// 远程调用记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    MoveDisk(MoveDiskRequest),
    ResizeDisk(ResizeDiskRequest),
    Reboot(u32),
    TaskStatus(TaskRef),
    VmStatus(String),
    VmConfig,
    AgentInterfaces,
    ListNodes,
}

/// 按顺序返回脚本中的结果，脚本耗尽后重复 fallback
struct Script<T> {
    queue: VecDeque<std::result::Result<T, String>>,
    fallback: std::result::Result<T, String>,
}

impl<T: Clone> Script<T> {
    fn new(fallback: std::result::Result<T, String>) -> Self {
        Self {
            queue: VecDeque::new(),
            fallback,
        }
    }

    fn next(&mut self) -> Result<T> {
        self.queue
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
            .map_err(Error::Transport)
    }
}

pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    task_statuses: Mutex<Script<TaskStatus>>,
    vm_statuses: Mutex<Script<VmStatusSnapshot>>,
    agent: Mutex<Script<Vec<NetworkInterface>>>,
    config: Mutex<VmConfig>,
    nodes: Vec<NodeInfo>,
    occupied: HashSet<(String, u32)>,
    fail_move: Option<String>,
    fail_resize: Option<String>,
    fail_reboot: Option<String>,
}

pub fn running() -> TaskStatus {
    TaskStatus {
        status: "running".to_string(),
        exit_status: None,
    }
}

pub fn stopped() -> TaskStatus {
    TaskStatus {
        status: "stopped".to_string(),
        exit_status: Some("OK".to_string()),
    }
}

pub fn vm_status(status: &str, lock: Option<&str>) -> VmStatusSnapshot {
    VmStatusSnapshot {
        status: status.to_string(),
        lock: lock.map(str::to_string),
    }
}

pub fn eth0() -> NetworkInterface {
    NetworkInterface {
        name: "eth0".to_string(),
        hardware_address: Some("52:54:00:12:34:56".to_string()),
        ip_addresses: Vec::new(),
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            task_statuses: Mutex::new(Script::new(Ok(stopped()))),
            vm_statuses: Mutex::new(Script::new(Ok(vm_status("running", None)))),
            agent: Mutex::new(Script::new(Ok(vec![eth0()]))),
            config: Mutex::new(VmConfig::default()),
            nodes: vec![NodeInfo {
                name: "pve1".to_string(),
                status: Some("online".to_string()),
            }],
            occupied: HashSet::new(),
            fail_move: None,
            fail_resize: None,
            fail_reboot: None,
        }
    }

    pub fn with_task_statuses(self, statuses: Vec<std::result::Result<TaskStatus, String>>) -> Self {
        self.task_statuses.lock().unwrap().queue.extend(statuses);
        self
    }

    pub fn with_vm_statuses(self, statuses: Vec<std::result::Result<VmStatusSnapshot, String>>) -> Self {
        self.vm_statuses.lock().unwrap().queue.extend(statuses);
        self
    }

    pub fn with_vm_status_fallback(self, fallback: std::result::Result<VmStatusSnapshot, String>) -> Self {
        self.vm_statuses.lock().unwrap().fallback = fallback;
        self
    }

    pub fn with_agent_responses(self, responses: Vec<std::result::Result<Vec<NetworkInterface>, String>>) -> Self {
        self.agent.lock().unwrap().queue.extend(responses);
        self
    }

    pub fn with_agent_fallback(self, fallback: std::result::Result<Vec<NetworkInterface>, String>) -> Self {
        self.agent.lock().unwrap().fallback = fallback;
        self
    }

    pub fn with_disk(self, key: &str, value: &str) -> Self {
        self.config
            .lock()
            .unwrap()
            .disks
            .insert(key.to_string(), DiskDescriptor::parse(value));
        self
    }

    pub fn with_nodes(mut self, names: &[&str]) -> Self {
        self.nodes = names
            .iter()
            .map(|name| NodeInfo {
                name: name.to_string(),
                status: Some("online".to_string()),
            })
            .collect();
        self
    }

    pub fn with_occupied(mut self, node: &str, vm_id: u32) -> Self {
        self.occupied.insert((node.to_string(), vm_id));
        self
    }

    pub fn failing_move(mut self, message: &str) -> Self {
        self.fail_move = Some(message.to_string());
        self
    }

    pub fn failing_resize(mut self, message: &str) -> Self {
        self.fail_resize = Some(message.to_string());
        self
    }

    pub fn failing_reboot(mut self, message: &str) -> Self {
        self.fail_reboot = Some(message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VmApi for MockApi {
    async fn move_disk(&self, vm: &VmLocation, request: &MoveDiskRequest) -> Result<TaskRef> {
        self.record(Call::MoveDisk(request.clone()));
        match &self.fail_move {
            Some(message) => Err(Error::Transport(message.clone())),
            None => {
                // 迁移完成后配置中的卷指向新存储
                if let Some(disk) = self.config.lock().unwrap().disks.get_mut(&request.disk) {
                    disk.volume = Some(format!("{}:vm-{}-disk-0", request.storage, vm.vm_id));
                }
                Ok(TaskRef(format!("UPID:{}:move:{}", vm.node, vm.vm_id)))
            }
        }
    }

    async fn resize_disk(&self, _vm: &VmLocation, request: &ResizeDiskRequest) -> Result<()> {
        self.record(Call::ResizeDisk(request.clone()));
        if let Some(message) = &self.fail_resize {
            return Err(Error::Transport(message.clone()));
        }
        if let Some(disk) = self.config.lock().unwrap().disks.get_mut(&request.disk) {
            disk.size = Some(request.size.clone());
        }
        Ok(())
    }

    async fn reboot_vm(&self, vm: &VmLocation, timeout_secs: u32) -> Result<TaskRef> {
        self.record(Call::Reboot(timeout_secs));
        match &self.fail_reboot {
            Some(message) => Err(Error::Transport(message.clone())),
            None => Ok(TaskRef(format!("UPID:{}:reboot:{}", vm.node, vm.vm_id))),
        }
    }

    async fn get_task_status(&self, _node: &str, task: &TaskRef) -> Result<TaskStatus> {
        self.record(Call::TaskStatus(task.clone()));
        self.task_statuses.lock().unwrap().next()
    }

    async fn get_vm_status(&self, vm: &VmLocation) -> Result<VmStatusSnapshot> {
        self.record(Call::VmStatus(vm.node.clone()));
        if !self.occupied.is_empty() {
            return if self.occupied.contains(&(vm.node.clone(), vm.vm_id)) {
                Ok(vm_status("running", None))
            } else {
                Err(Error::Http {
                    status: 500,
                    message: format!("VM {} does not exist", vm.vm_id),
                })
            };
        }
        self.vm_statuses.lock().unwrap().next()
    }

    async fn get_vm_config(&self, _vm: &VmLocation) -> Result<VmConfig> {
        self.record(Call::VmConfig);
        Ok(self.config.lock().unwrap().clone())
    }

    async fn get_agent_network_interfaces(&self, _vm: &VmLocation) -> Result<Vec<NetworkInterface>> {
        self.record(Call::AgentInterfaces);
        self.agent.lock().unwrap().next()
    }

    async fn list_nodes(&self) -> Result<Vec<NodeInfo>> {
        self.record(Call::ListNodes);
        Ok(self.nodes.clone())
    }
}
