//! 把预编译好的 ebpf 探针挂到 syscall tracepoint 上, 直到收到退出信号
//!
//! The probe object is loaded from disk as an opaque blob through a
//! [`ProbeLoader`]; [`libbpf::LibbpfLoader`] does the real work, tests plug in
//! a fake.

pub mod config;
pub mod error;
pub mod event;
pub mod libbpf;
pub mod loader;
pub mod logging;
pub mod pin;
pub mod rlimit;
pub mod session;
pub mod shutdown;
pub mod verifier;

pub use config::{ProbeConfig, Tracepoint};
pub use error::{LoadError, ProbeError, VerifierError};
pub use event::PacketEvent;
pub use loader::{Collection, ProbeLoader};
pub use session::{attach, Attached, Summary};
pub use shutdown::Shutdown;
