use thiserror::Error;

use crate::models::ModifyStage;

/// 统一错误类型
#[derive(Error, Debug)]
pub enum Error {
    #[error("传输错误: {0}")]
    Transport(String),

    #[error("HTTP 错误 {status}: {message}")]
    Http { status: u16, message: String },

    #[error("服务器响应中缺少 data 对象: {0}")]
    MissingData(String),

    #[error("等待 VM \"{vm_id}\" {condition} 超时")]
    Timeout { vm_id: u32, condition: String },

    #[error("无法分配下一个可用的 VM ID")]
    AllocationExhausted,

    #[error("无效参数: {0}")]
    InvalidArgument(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("步骤 {stage} 失败 (已完成: {}): {source}", format_stages(.completed))]
    StepFailed {
        stage: ModifyStage,
        completed: Vec<ModifyStage>,
        #[source]
        source: Box<Error>,
    },

    #[error("配置错误: {0}")]
    Config(String),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// 是否为等待超时
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout { .. } => true,
            Error::StepFailed { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// 编排失败时所在的步骤
    pub fn failed_stage(&self) -> Option<ModifyStage> {
        match self {
            Error::StepFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Error::InvalidArgument(err.to_string())
    }
}

fn format_stages(stages: &[ModifyStage]) -> String {
    if stages.is_empty() {
        return "无".to_string();
    }
    stages
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// 统一结果类型
pub type Result<T> = std::result::Result<T, Error>;
