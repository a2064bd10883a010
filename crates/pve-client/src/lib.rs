/// Proxmox VE API 客户端
///
/// 基于 HTTPS 的 `VmApi` 实现，只覆盖编排器需要的调用

pub mod client;

pub use client::{ClientOptions, ProxmoxClient};
