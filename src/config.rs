use std::{
    fmt,
    path::{Path, PathBuf},
};

/// 预编译好的探针字节码
pub const OBJECT_PATH: &str = "./target/hello.o";

/// 上一次运行残留的 pin 目录
pub const PIN_PATH: &str = "/sys/fs/bpf/hello";

pub const PROGRAM_NAME: &str = "handle_tp";

pub const TRACEPOINT_CATEGORY: &str = "syscalls";
pub const TRACEPOINT_NAME: &str = "sys_enter_write";

/// A kernel tracepoint, addressed by category and event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tracepoint {
    category: String,
    name: String,
}

impl Tracepoint {
    pub fn new(category: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            name: name.into(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Tracepoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// Everything the session needs to know about where the probe lives and
/// where it gets attached.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub object_path: PathBuf,
    pub pin_path: PathBuf,
    pub program: String,
    pub tracepoint: Tracepoint,
}

impl ProbeConfig {
    pub fn object_path(&self) -> &Path {
        &self.object_path
    }

    pub fn pin_path(&self) -> &Path {
        &self.pin_path
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            object_path: PathBuf::from(OBJECT_PATH),
            pin_path: PathBuf::from(PIN_PATH),
            program: PROGRAM_NAME.to_string(),
            tracepoint: Tracepoint::new(TRACEPOINT_CATEGORY, TRACEPOINT_NAME),
        }
    }
}
