use std::{
    env, io,
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};

use libbpf_rs::{Link, Object, ObjectBuilder, OpenObject, PrintLevel};
use tracing::{debug, info, warn};

use crate::{
    config::Tracepoint,
    error::{BoxError, LoadError, VerifierError},
    loader::{Collection, ProbeLoader},
    rlimit,
    verifier::VerifierLogCollector,
};

// libbpf 的打印回调是进程级别的, 只能用静态变量收集 verifier 日志
static VERIFIER_LOG: Mutex<VerifierLogCollector> = Mutex::new(VerifierLogCollector::new());

fn verifier_log() -> MutexGuard<'static, VerifierLogCollector> {
    VERIFIER_LOG.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn print_level(verbose: bool) -> PrintLevel {
    if verbose {
        return PrintLevel::Debug;
    }

    match env::var("LOG") {
        Ok(s) if s == "DEBUG" => PrintLevel::Debug,
        _ => PrintLevel::Info,
    }
}

fn print_to_log(level: PrintLevel, msg: String) {
    verifier_log().feed(&msg);

    let msg = msg.trim_end();
    match level {
        PrintLevel::Warn => warn!(target: "libbpf", "{}", msg),
        PrintLevel::Info => info!(target: "libbpf", "{}", msg),
        PrintLevel::Debug => debug!(target: "libbpf", "{}", msg),
    }
}

/// Routes libbpf's own output through `tracing`.
pub fn init_libbpf_log(verbose: bool) {
    libbpf_rs::set_print(Some((print_level(verbose), print_to_log)));
}

fn classify(err: libbpf_rs::Error) -> LoadError {
    let errno = match &err {
        libbpf_rs::Error::System(errno) => Some(errno.abs()),
        _ => None,
    };

    match verifier_log().take() {
        Some(log) => LoadError::Verifier(VerifierError {
            errno,
            program: log.program,
            reason: log.reason,
            log: log.lines,
        }),
        None => LoadError::other(err),
    }
}

/// 不要调用 `ObjectBuilder::debug`: 它会替换掉 `init_libbpf_log` 注册的回调,
/// verifier 日志就收不到了
#[derive(Debug, Default)]
pub struct LibbpfLoader;

impl ProbeLoader for LibbpfLoader {
    type Spec = OpenObject;
    type Collection = LibbpfCollection;

    fn relax_memlock(&self) -> io::Result<()> {
        rlimit::remove_memlock()
    }

    fn load_spec(&self, path: &Path) -> Result<OpenObject, LoadError> {
        verifier_log().reset();

        ObjectBuilder::default().open_file(path).map_err(classify)
    }

    fn instantiate(&self, spec: OpenObject) -> Result<LibbpfCollection, LoadError> {
        verifier_log().reset();

        spec.load()
            .map(|object| LibbpfCollection { object })
            .map_err(classify)
    }
}

pub struct LibbpfCollection {
    object: Object,
}

impl Collection for LibbpfCollection {
    type Link = Link;

    fn program_names(&self) -> Vec<String> {
        self.object
            .progs_iter()
            .map(|prog| prog.name().to_string())
            .collect()
    }

    fn contains_program(&self, name: &str) -> bool {
        self.object.prog(name).is_some()
    }

    fn attach_tracepoint(&mut self, program: &str, tracepoint: &Tracepoint) -> Result<Link, BoxError> {
        let prog = self
            .object
            .prog_mut(program)
            .ok_or_else(|| format!("program '{}' not found", program))?;

        let link = prog.attach_tracepoint(tracepoint.category(), tracepoint.name())?;
        Ok(link)
    }
}
