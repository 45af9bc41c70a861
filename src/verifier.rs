//! 从 libbpf 的打印输出中收集 verifier 日志
//!
//! libbpf reports a rejected program like this:
//!
//! ```text
//! libbpf: prog 'handle_tp': BPF program load failed: Permission denied
//! libbpf: prog 'handle_tp': -- BEGIN PROG LOAD LOG --
//! 0: R1=ctx(off=0,imm=0) R10=fp0
//! ...
//! -- END PROG LOAD LOG --
//! ```
//!
//! Messages may arrive one line at a time or as a single multi-line chunk.

const BEGIN_MARKER: &str = "-- BEGIN PROG LOAD LOG --";
const END_MARKER: &str = "-- END PROG LOAD LOG --";
const LOAD_FAILED: &str = "BPF program load failed:";

/// A complete verifier log for one program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifierLog {
    pub program: Option<String>,
    pub reason: Option<String>,
    pub lines: Vec<String>,
}

#[derive(Debug)]
pub struct VerifierLogCollector {
    capturing: bool,
    current: Option<VerifierLog>,
    completed: Option<VerifierLog>,
}

impl VerifierLogCollector {
    pub const fn new() -> Self {
        Self {
            capturing: false,
            current: None,
            completed: None,
        }
    }

    pub fn feed(&mut self, msg: &str) {
        for line in msg.lines() {
            self.feed_line(line);
        }
    }

    fn feed_line(&mut self, line: &str) {
        if self.capturing {
            if line.contains(END_MARKER) {
                self.capturing = false;
                self.completed = self.current.take();
            } else if let Some(log) = self.current.as_mut() {
                log.lines.push(line.to_string());
            }
            return;
        }

        if let Some(pos) = line.find(LOAD_FAILED) {
            let log = self.current.get_or_insert_with(VerifierLog::default);
            log.program = program_name(line);
            log.reason = Some(line[pos + LOAD_FAILED.len()..].trim().to_string());
        } else if line.contains(BEGIN_MARKER) {
            let log = self.current.get_or_insert_with(VerifierLog::default);
            if log.program.is_none() {
                log.program = program_name(line);
            }
            self.capturing = true;
        }
    }

    /// Hands out the last complete log and forgets everything seen so far.
    pub fn take(&mut self) -> Option<VerifierLog> {
        let log = self.completed.take();
        self.reset();
        log
    }

    pub fn reset(&mut self) {
        self.capturing = false;
        self.current = None;
        self.completed = None;
    }
}

impl Default for VerifierLogCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn program_name(line: &str) -> Option<String> {
    let start = line.find("prog '")? + "prog '".len();
    let len = line[start..].find('\'')?;
    Some(line[start..start + len].to_string())
}
