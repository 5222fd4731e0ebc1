use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TinylinkError {
    InvalidUrl(String),
    Conflict(String),
    NotFound(String),
    Gone(String),
    Timeout(String),
    QueueClosed(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    StorageOperation(String),
    FileOperation(String),
    Serialization(String),
}

impl TinylinkError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            TinylinkError::InvalidUrl(_) => "E001",
            TinylinkError::Conflict(_) => "E002",
            TinylinkError::NotFound(_) => "E003",
            TinylinkError::Gone(_) => "E004",
            TinylinkError::Timeout(_) => "E005",
            TinylinkError::QueueClosed(_) => "E006",
            TinylinkError::DatabaseConfig(_) => "E007",
            TinylinkError::DatabaseConnection(_) => "E008",
            TinylinkError::StorageOperation(_) => "E009",
            TinylinkError::FileOperation(_) => "E010",
            TinylinkError::Serialization(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            TinylinkError::InvalidUrl(_) => "Invalid URL",
            TinylinkError::Conflict(_) => "Short Code Conflict",
            TinylinkError::NotFound(_) => "Resource Not Found",
            TinylinkError::Gone(_) => "Resource Gone",
            TinylinkError::Timeout(_) => "Operation Timeout",
            TinylinkError::QueueClosed(_) => "Queue Closed",
            TinylinkError::DatabaseConfig(_) => "Database Configuration Error",
            TinylinkError::DatabaseConnection(_) => "Database Connection Error",
            TinylinkError::StorageOperation(_) => "Storage Operation Error",
            TinylinkError::FileOperation(_) => "File Operation Error",
            TinylinkError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            TinylinkError::InvalidUrl(msg) => msg,
            TinylinkError::Conflict(msg) => msg,
            TinylinkError::NotFound(msg) => msg,
            TinylinkError::Gone(msg) => msg,
            TinylinkError::Timeout(msg) => msg,
            TinylinkError::QueueClosed(msg) => msg,
            TinylinkError::DatabaseConfig(msg) => msg,
            TinylinkError::DatabaseConnection(msg) => msg,
            TinylinkError::StorageOperation(msg) => msg,
            TinylinkError::FileOperation(msg) => msg,
            TinylinkError::Serialization(msg) => msg,
        }
    }

    /// 对应的 HTTP 状态码，由外部 HTTP 层决定如何映射
    pub fn status(&self) -> u16 {
        match self {
            TinylinkError::InvalidUrl(_) => 400,
            TinylinkError::NotFound(_) => 404,
            TinylinkError::Conflict(_) => 409,
            TinylinkError::Gone(_) => 410,
            TinylinkError::QueueClosed(_) => 503,
            TinylinkError::Timeout(_) => 504,
            TinylinkError::DatabaseConfig(_)
            | TinylinkError::DatabaseConnection(_)
            | TinylinkError::StorageOperation(_)
            | TinylinkError::FileOperation(_)
            | TinylinkError::Serialization(_) => 500,
        }
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for TinylinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for TinylinkError {}

// 便捷的构造函数
impl TinylinkError {
    pub fn invalid_url<T: Into<String>>(msg: T) -> Self {
        TinylinkError::InvalidUrl(msg.into())
    }

    pub fn conflict<T: Into<String>>(msg: T) -> Self {
        TinylinkError::Conflict(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        TinylinkError::NotFound(msg.into())
    }

    pub fn gone<T: Into<String>>(msg: T) -> Self {
        TinylinkError::Gone(msg.into())
    }

    pub fn timeout<T: Into<String>>(msg: T) -> Self {
        TinylinkError::Timeout(msg.into())
    }

    pub fn queue_closed<T: Into<String>>(msg: T) -> Self {
        TinylinkError::QueueClosed(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        TinylinkError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        TinylinkError::DatabaseConnection(msg.into())
    }

    pub fn storage_operation<T: Into<String>>(msg: T) -> Self {
        TinylinkError::StorageOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        TinylinkError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        TinylinkError::Serialization(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for TinylinkError {
    fn from(err: sea_orm::DbErr) -> Self {
        TinylinkError::StorageOperation(err.to_string())
    }
}

impl From<std::io::Error> for TinylinkError {
    fn from(err: std::io::Error) -> Self {
        TinylinkError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for TinylinkError {
    fn from(err: serde_json::Error) -> Self {
        TinylinkError::Serialization(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for TinylinkError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        TinylinkError::Timeout(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TinylinkError>;
