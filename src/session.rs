use tracing::{debug, info};

use crate::{
    config::{ProbeConfig, Tracepoint},
    error::ProbeError,
    loader::{Collection, ProbeLoader},
    pin,
    shutdown::Shutdown,
};

/// A probe that is loaded and attached.
///
/// Fields drop in declaration order, so the link is always released before
/// the collection it was created from.
pub struct Attached<C: Collection> {
    link: C::Link,
    collection: C,
    program: String,
    tracepoint: Tracepoint,
}

/// What was running once the session is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub programs: usize,
}

/// Prepares the host, loads the probe and attaches it.
///
/// Every failure is terminal. Anything acquired before the failure is released
/// on the way out.
pub fn attach<L>(loader: &L, config: &ProbeConfig) -> Result<Attached<L::Collection>, ProbeError>
where
    L: ProbeLoader,
{
    loader.relax_memlock().map_err(ProbeError::Memlock)?;
    pin::remove_stale(config.pin_path());

    // 读取字节码
    let spec = loader
        .load_spec(config.object_path())
        .map_err(|source| ProbeError::Spec {
            path: config.object_path.clone(),
            source,
        })?;

    // 加载ebpf程序到内核
    let mut collection = loader.instantiate(spec).map_err(ProbeError::Instantiate)?;
    debug!(programs = ?collection.program_names(), "eBPF collection loaded");

    if !collection.contains_program(&config.program) {
        return Err(ProbeError::ProgramNotFound(config.program.clone()));
    }

    // attach ebpf程序到挂载点
    let link = collection
        .attach_tracepoint(&config.program, &config.tracepoint)
        .map_err(|source| ProbeError::Attach {
            program: config.program.clone(),
            tracepoint: config.tracepoint.clone(),
            source,
        })?;

    info!(
        "eBPF program attached successfully to {} tracepoint",
        config.tracepoint.name()
    );

    Ok(Attached {
        link,
        collection,
        program: config.program.clone(),
        tracepoint: config.tracepoint.clone(),
    })
}

impl<C: Collection> Attached<C> {
    pub fn collection(&self) -> &C {
        &self.collection
    }

    /// Blocks until `shutdown` fires, then tears everything down.
    pub async fn run_until(self, shutdown: &Shutdown) -> Summary {
        shutdown.wait().await;
        self.close()
    }

    /// Releases the link, then the collection.
    pub fn close(self) -> Summary {
        let Attached {
            link,
            collection,
            program,
            tracepoint,
        } = self;
        let programs = collection.program_names().len();

        drop(link);
        debug!(%program, %tracepoint, "tracepoint link released");

        drop(collection);
        debug!("eBPF collection closed");

        Summary { programs }
    }
}
