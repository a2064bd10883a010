/// Proxmox VE HTTP 客户端

use async_trait::async_trait;
use common::api::{MoveDiskRequest, ResizeDiskRequest};
use common::models::{
    NetworkInterface, NodeInfo, TaskRef, TaskStatus, VmConfig, VmLocation, VmStatusSnapshot,
};
use common::utils::api_bool;
use common::{Error, Result, VmApi};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// 客户端选项
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// 例如 https://pve.example.com:8006
    pub endpoint: String,
    /// `USER@REALM!TOKENID=SECRET`
    pub api_token: Option<String>,
    /// 接受自签名证书
    pub insecure: bool,
    pub timeout: Duration,
}

impl ClientOptions {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_token: None,
            insecure: false,
            timeout: Duration::from_secs(30),
        }
    }
}

/// 响应信封，所有接口的数据都在 data 字段中
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct AgentInterfacesData {
    #[serde(default)]
    result: Vec<NetworkInterface>,
}

#[derive(Debug, Serialize)]
struct MoveDiskForm<'a> {
    disk: &'a str,
    storage: &'a str,
    delete: u8,
}

#[derive(Debug, Serialize)]
struct RebootForm {
    timeout: u32,
}

/// Proxmox VE API 客户端
#[derive(Clone)]
pub struct ProxmoxClient {
    base_url: Url,
    client: reqwest::Client,
    api_token: Option<String>,
}

impl ProxmoxClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let base_url = Self::base_url(&options.endpoint)?;

        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(options.insecure)
            .timeout(options.timeout)
            .build()
            .map_err(|e| Error::Config(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self {
            base_url,
            client,
            api_token: options.api_token,
        })
    }

    fn base_url(endpoint: &str) -> Result<Url> {
        let mut url = Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("无效的 API 地址 {}: {}", endpoint, e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("无效的 API 地址: {}", endpoint)))?
            .pop_if_empty()
            .extend(["api2", "json"]);
        Ok(url)
    }

    /// 拼接路径，每个片段单独转义
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("无效的 API 地址: {}", self.base_url)))?
            .extend(segments);
        Ok(url)
    }

    fn vm_segments<'a>(vm: &'a VmLocation, vm_id: &'a str, tail: &[&'a str]) -> Vec<&'a str> {
        let mut segments = vec!["nodes", vm.node.as_str(), "qemu", vm_id];
        segments.extend_from_slice(tail);
        segments
    }

    /// 发送请求并返回 data 字段（可能为空）
    async fn request<B, T>(&self, method: Method, segments: &[&str], form: Option<&B>) -> Result<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url(segments)?;
        debug!("PVE request: {} {}", method, url.path());

        let mut request = self.client.request(method, url.clone());
        if let Some(token) = &self.api_token {
            request = request.header("Authorization", format!("PVEAPIToken={}", token));
        }
        if let Some(form) = form {
            request = request.form(form);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{}: {}", url.path(), e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Transport(format!("{}: {}", url.path(), e)))?;

        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("request failed");
            return Err(Error::Http {
                status: status.as_u16(),
                message: format!("{} {}", reason, body.trim()).trim().to_string(),
            });
        }

        decode_envelope(&body)
    }

    /// 要求响应包含 data 字段
    async fn request_data<B, T>(&self, method: Method, segments: &[&str], form: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(method, segments, form)
            .await?
            .ok_or_else(|| Error::MissingData(segments.join("/")))
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        self.request_data::<(), T>(Method::GET, segments, None).await
    }
}

/// 解析 `{"data": ...}` 信封
fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<Option<T>> {
    let envelope: ApiResponse<T> = serde_json::from_str(body)?;
    Ok(envelope.data)
}

#[async_trait]
impl VmApi for ProxmoxClient {
    async fn move_disk(&self, vm: &VmLocation, request: &MoveDiskRequest) -> Result<TaskRef> {
        let vm_id = vm.vm_id.to_string();
        let form = MoveDiskForm {
            disk: &request.disk,
            storage: &request.storage,
            delete: api_bool(request.delete),
        };
        let upid: String = self
            .request_data(Method::POST, &Self::vm_segments(vm, &vm_id, &["move_disk"]), Some(&form))
            .await?;
        Ok(TaskRef(upid))
    }

    async fn resize_disk(&self, vm: &VmLocation, request: &ResizeDiskRequest) -> Result<()> {
        let vm_id = vm.vm_id.to_string();
        self.request::<_, serde_json::Value>(
            Method::PUT,
            &Self::vm_segments(vm, &vm_id, &["resize"]),
            Some(request),
        )
        .await?;
        Ok(())
    }

    async fn reboot_vm(&self, vm: &VmLocation, timeout_secs: u32) -> Result<TaskRef> {
        let vm_id = vm.vm_id.to_string();
        let form = RebootForm {
            timeout: timeout_secs,
        };
        let upid: String = self
            .request_data(
                Method::POST,
                &Self::vm_segments(vm, &vm_id, &["status", "reboot"]),
                Some(&form),
            )
            .await?;
        Ok(TaskRef(upid))
    }

    async fn get_task_status(&self, node: &str, task: &TaskRef) -> Result<TaskStatus> {
        self.get(&["nodes", node, "tasks", task.as_str(), "status"]).await
    }

    async fn get_vm_status(&self, vm: &VmLocation) -> Result<VmStatusSnapshot> {
        let vm_id = vm.vm_id.to_string();
        self.get(&Self::vm_segments(vm, &vm_id, &["status", "current"])).await
    }

    async fn get_vm_config(&self, vm: &VmLocation) -> Result<VmConfig> {
        let vm_id = vm.vm_id.to_string();
        let raw: serde_json::Map<String, serde_json::Value> =
            self.get(&Self::vm_segments(vm, &vm_id, &["config"])).await?;
        Ok(VmConfig::from_raw(&raw))
    }

    async fn get_agent_network_interfaces(&self, vm: &VmLocation) -> Result<Vec<NetworkInterface>> {
        let vm_id = vm.vm_id.to_string();
        let data: AgentInterfacesData = self
            .get(&Self::vm_segments(vm, &vm_id, &["agent", "network-get-interfaces"]))
            .await?;
        Ok(data.result)
    }

    async fn list_nodes(&self) -> Result<Vec<NodeInfo>> {
        self.get(&["nodes"]).await
    }
}
