use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocError>;

/// 导航文档相关的错误类型
#[derive(Error, Debug)]
pub enum DocError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("脚本语法错误 (第{line}行, 第{column}列): {message}")]
    Script {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("导航数据校验失败: {0}")]
    Validation(String),

    #[error("页面索引越界: {index}, 索引长度: {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("文档包中缺少文件: {0}")]
    MissingFile(String),

    #[error("配置文件错误: {0}")]
    Config(String),
}

impl DocError {
    /// 构造校验错误
    pub fn validation(message: impl Into<String>) -> Self {
        DocError::Validation(message.into())
    }

    /// 是否为校验错误
    pub fn is_validation(&self) -> bool {
        matches!(self, DocError::Validation(_))
    }
}
