use std::{
    fs, io,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use hellobpf::{
    error::BoxError, Collection, LoadError, ProbeConfig, ProbeError, ProbeLoader, Shutdown,
    Tracepoint, VerifierError,
};

#[derive(Debug, Clone, Default)]
struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    None,
    Generic,
    Verifier,
}

impl Failure {
    fn into_result<T>(self, ok: T) -> Result<T, LoadError> {
        match self {
            Failure::None => Ok(ok),
            Failure::Generic => Err(LoadError::other("invalid ELF header")),
            Failure::Verifier => Err(LoadError::Verifier(VerifierError {
                errno: Some(13),
                program: Some("handle_tp".to_string()),
                reason: Some("Permission denied".to_string()),
                log: vec!["R1 invalid mem access 'scalar'".to_string()],
            })),
        }
    }
}

struct FakeLoader {
    journal: Journal,
    memlock_denied: bool,
    spec: Failure,
    instantiate: Failure,
    programs: Vec<&'static str>,
    attach_fails: bool,
}

impl FakeLoader {
    fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            memlock_denied: false,
            spec: Failure::None,
            instantiate: Failure::None,
            programs: vec!["handle_tp"],
            attach_fails: false,
        }
    }
}

struct FakeSpec {
    programs: Vec<String>,
}

struct FakeCollection {
    journal: Journal,
    programs: Vec<String>,
    attach_fails: bool,
}

struct FakeLink {
    journal: Journal,
}

impl Drop for FakeCollection {
    fn drop(&mut self) {
        self.journal.record("collection closed");
    }
}

impl Drop for FakeLink {
    fn drop(&mut self) {
        self.journal.record("link closed");
    }
}

impl ProbeLoader for FakeLoader {
    type Spec = FakeSpec;
    type Collection = FakeCollection;

    fn relax_memlock(&self) -> io::Result<()> {
        self.journal.record("memlock");
        if self.memlock_denied {
            return Err(io::Error::from_raw_os_error(1));
        }
        Ok(())
    }

    fn load_spec(&self, path: &Path) -> Result<FakeSpec, LoadError> {
        self.journal.record(format!("load spec {}", path.display()));
        self.spec.into_result(FakeSpec {
            programs: self.programs.iter().map(|p| p.to_string()).collect(),
        })
    }

    fn instantiate(&self, spec: FakeSpec) -> Result<FakeCollection, LoadError> {
        self.journal.record("instantiate");
        self.instantiate.into_result(()).map(|()| FakeCollection {
            journal: self.journal.clone(),
            programs: spec.programs,
            attach_fails: self.attach_fails,
        })
    }
}

impl Collection for FakeCollection {
    type Link = FakeLink;

    fn program_names(&self) -> Vec<String> {
        self.programs.clone()
    }

    fn attach_tracepoint(
        &mut self,
        program: &str,
        tracepoint: &Tracepoint,
    ) -> Result<FakeLink, BoxError> {
        self.journal.record(format!("attach {} {}", program, tracepoint));
        if self.attach_fails {
            return Err("tracepoint does not exist".into());
        }
        Ok(FakeLink {
            journal: self.journal.clone(),
        })
    }
}

fn config_in(dir: &Path) -> ProbeConfig {
    ProbeConfig {
        pin_path: dir.join("hello"),
        ..ProbeConfig::default()
    }
}

#[tokio::test]
async fn attaches_and_releases_link_before_collection() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let journal = Journal::default();
    let loader = FakeLoader::new(&journal);

    let attached = hellobpf::attach(&loader, &config).unwrap();
    assert_eq!(attached.collection().program_names(), vec!["handle_tp"]);

    let shutdown = Shutdown::new();
    let listener = shutdown.clone();
    let signal = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        listener.on_signal();
    });

    let summary = tokio::time::timeout(Duration::from_secs(5), attached.run_until(&shutdown))
        .await
        .expect("session should stop after the signal");
    signal.await.unwrap();

    assert_eq!(summary.programs, 1);
    assert_eq!(
        journal.entries(),
        vec![
            "memlock",
            "load spec ./target/hello.o",
            "instantiate",
            "attach handle_tp syscalls/sys_enter_write",
            "link closed",
            "collection closed",
        ]
    );
}

#[tokio::test]
async fn second_signal_has_no_effect() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Journal::default();
    let loader = FakeLoader::new(&journal);
    let attached = hellobpf::attach(&loader, &config_in(dir.path())).unwrap();

    let shutdown = Shutdown::new();
    shutdown.on_signal();
    attached.run_until(&shutdown).await;
    let after_first = journal.entries();

    shutdown.on_signal();
    assert!(!shutdown.trigger());
    assert_eq!(journal.entries(), after_first);
}

#[test]
fn dropping_an_attached_session_keeps_release_order() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Journal::default();
    let loader = FakeLoader::new(&journal);

    let attached = hellobpf::attach(&loader, &config_in(dir.path())).unwrap();
    drop(attached);

    let entries = journal.entries();
    assert_eq!(&entries[entries.len() - 2..], ["link closed", "collection closed"]);
}

#[test]
fn memlock_failure_stops_before_loading() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    fs::create_dir_all(config.pin_path()).unwrap();

    let journal = Journal::default();
    let mut loader = FakeLoader::new(&journal);
    loader.memlock_denied = true;

    let err = hellobpf::attach(&loader, &config).err().unwrap();

    assert!(matches!(err, ProbeError::Memlock(_)));
    assert_eq!(journal.entries(), vec!["memlock"]);
    assert!(config.pin_path().exists());
}

#[test]
fn stale_pin_directory_is_removed_before_loading() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    fs::create_dir_all(config.pin_path().join("maps")).unwrap();

    let journal = Journal::default();
    let loader = FakeLoader::new(&journal);
    let _attached = hellobpf::attach(&loader, &config).unwrap();

    assert!(!config.pin_path().exists());
}

#[test]
fn verifier_rejection_on_spec_load_is_distinguished() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Journal::default();
    let mut loader = FakeLoader::new(&journal);
    loader.spec = Failure::Verifier;

    let err = hellobpf::attach(&loader, &config_in(dir.path())).err().unwrap();

    assert!(matches!(err, ProbeError::Spec { .. }));
    let verifier = err.verifier().expect("verifier detail");
    assert_eq!(verifier.log, vec!["R1 invalid mem access 'scalar'"]);
    assert!(!journal.entries().contains(&"instantiate".to_string()));
}

#[test]
fn generic_spec_failure_is_not_a_verifier_error() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Journal::default();
    let mut loader = FakeLoader::new(&journal);
    loader.spec = Failure::Generic;

    let err = hellobpf::attach(&loader, &config_in(dir.path())).err().unwrap();

    assert!(matches!(err, ProbeError::Spec { .. }));
    assert!(err.verifier().is_none());
    assert!(err.to_string().contains("invalid ELF header"));
}

#[test]
fn verifier_rejection_on_instantiate_is_distinguished() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Journal::default();
    let mut loader = FakeLoader::new(&journal);
    loader.instantiate = Failure::Verifier;

    let err = hellobpf::attach(&loader, &config_in(dir.path())).err().unwrap();

    assert!(matches!(err, ProbeError::Instantiate(LoadError::Verifier(_))));
    assert!(err.verifier().is_some());
}

#[test]
fn missing_program_is_fatal_without_attaching() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Journal::default();
    let mut loader = FakeLoader::new(&journal);
    loader.programs = vec!["other_prog"];

    let err = hellobpf::attach(&loader, &config_in(dir.path())).err().unwrap();

    assert!(matches!(err, ProbeError::ProgramNotFound(ref name) if name == "handle_tp"));
    let entries = journal.entries();
    assert!(entries.iter().all(|e| !e.starts_with("attach")));
    assert_eq!(entries.last().map(String::as_str), Some("collection closed"));
}

#[test]
fn attach_failure_closes_the_collection() {
    let dir = tempfile::tempdir().unwrap();
    let journal = Journal::default();
    let mut loader = FakeLoader::new(&journal);
    loader.attach_fails = true;

    let err = hellobpf::attach(&loader, &config_in(dir.path())).err().unwrap();

    match &err {
        ProbeError::Attach {
            program,
            tracepoint,
            ..
        } => {
            assert_eq!(program, "handle_tp");
            assert_eq!(tracepoint.to_string(), "syscalls/sys_enter_write");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        journal.entries().last().map(String::as_str),
        Some("collection closed")
    );
}
