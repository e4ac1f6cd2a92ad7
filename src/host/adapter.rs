//! Canonical host-facing operations
//!
//! Every exported entry point (narrow or wide) converts its strings and then
//! calls one of the functions here, which speak host result codes. Open
//! archives live in a process-wide registry keyed by opaque tokens; a token
//! that was never issued or is already closed simply fails the lookup.

use crate::archive::{pack_file, single_item, ArchiveHandle, EntryMetadata, PackOptions, ProcessOp};
use crate::error::{codes, ArchiveError};
use crate::host::strings::{encode_narrow, encode_wide};
use crate::progress::ProgressGate;
use crate::settings::{settings_path_for, Settings};
use std::collections::BTreeMap;
use std::os::raw::{c_char, c_int};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Opaque archive token handed to the host
pub type Token = isize;

/// Token the host uses to address pack-time settings instead of an archive
pub const DEFAULT_TOKEN: Token = -1;

/// Longest display name passed to a progress callback
const CALLBACK_NAME_UNITS: usize = 1024;

pub type ProcessDataProc = extern "system" fn(file_name: *mut c_char, size: c_int) -> c_int;
pub type ProcessDataProcW = extern "system" fn(file_name: *mut u16, size: c_int) -> c_int;

/// Progress callbacks registered by the host; the wide one wins when both are set
#[derive(Debug, Clone, Copy, Default)]
pub struct HostCallbacks {
    pub narrow: Option<ProcessDataProc>,
    pub wide: Option<ProcessDataProcW>,
}

impl HostCallbacks {
    pub const fn empty() -> Self {
        Self {
            narrow: None,
            wide: None,
        }
    }

    /// Build a gate calling whichever convention was registered
    pub fn to_gate(self) -> ProgressGate {
        match (self.wide, self.narrow) {
            (Some(callback), _) => ProgressGate::new(move |name, delta| {
                let mut buf = vec![0u16; CALLBACK_NAME_UNITS];
                encode_wide(name, &mut buf);
                callback(buf.as_mut_ptr(), clamp_delta(delta)) != 0
            }),
            (None, Some(callback)) => ProgressGate::new(move |name, delta| {
                let mut buf = vec![0u8; CALLBACK_NAME_UNITS];
                encode_narrow(name, &mut buf);
                callback(buf.as_mut_ptr() as *mut c_char, clamp_delta(delta)) != 0
            }),
            (None, None) => ProgressGate::unavailable(),
        }
    }
}

fn clamp_delta(delta: i64) -> c_int {
    delta.clamp(c_int::MIN as i64, c_int::MAX as i64) as c_int
}

/// Which calling convention a callback registration uses
#[derive(Debug, Clone, Copy)]
pub enum CallbackRegistration {
    Narrow(Option<ProcessDataProc>),
    Wide(Option<ProcessDataProcW>),
}

impl CallbackRegistration {
    fn apply(self, callbacks: &mut HostCallbacks) {
        match self {
            CallbackRegistration::Narrow(cb) => callbacks.narrow = cb,
            CallbackRegistration::Wide(cb) => callbacks.wide = cb,
        }
    }
}

struct Session {
    handle: ArchiveHandle,
    callbacks: HostCallbacks,
}

struct Registry {
    sessions: BTreeMap<Token, Session>,
    /// Sessions out on a process call, with registrations made meanwhile
    busy: BTreeMap<Token, Vec<CallbackRegistration>>,
    last: Token,
}

impl Registry {
    const fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            busy: BTreeMap::new(),
            last: 0,
        }
    }

    /// Take a session out for a process call
    fn check_out(&mut self, token: Token) -> Option<Session> {
        let session = self.sessions.remove(&token)?;
        self.busy.insert(token, Vec::new());
        Some(session)
    }

    /// Put a session back, applying registrations made while it was out
    fn check_in(&mut self, token: Token, mut session: Session) {
        let pending = self.busy.remove(&token).unwrap_or_default();
        if !pending.is_empty() {
            for registration in pending {
                registration.apply(&mut session.callbacks);
            }
            let gate = session.callbacks.to_gate();
            session.handle.set_progress_gate(gate);
        }
        self.sessions.insert(token, session);
    }

    fn insert(&mut self, session: Session) -> Token {
        loop {
            self.last = if self.last >= Token::MAX { 1 } else { self.last + 1 };
            if !self.sessions.contains_key(&self.last) && !self.busy.contains_key(&self.last) {
                break;
            }
        }
        self.sessions.insert(self.last, session);
        self.last
    }
}

/// Process-wide host configuration.
///
/// Written by `SetProcessDataProc(W)` with [`DEFAULT_TOKEN`] and by
/// `PackSetDefaultParams`, both of which the host calls before its first
/// pack request; read by every pack call.
struct HostConfig {
    default_callbacks: HostCallbacks,
    settings_path: Option<PathBuf>,
}

impl HostConfig {
    const fn new() -> Self {
        Self {
            default_callbacks: HostCallbacks::empty(),
            settings_path: None,
        }
    }
}

static REGISTRY: Mutex<Registry> = Mutex::new(Registry::new());
static HOST_CONFIG: Mutex<HostConfig> = Mutex::new(HostConfig::new());

fn registry() -> MutexGuard<'static, Registry> {
    REGISTRY.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn host_config() -> MutexGuard<'static, HostConfig> {
    HOST_CONFIG.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Open an archive and register it. Err carries the open result code.
pub fn open_archive(path: &str) -> Result<Token, i32> {
    match ArchiveHandle::open(path) {
        Ok(handle) => Ok(registry().insert(Session {
            handle,
            callbacks: HostCallbacks::empty(),
        })),
        Err(err) => {
            tracing::debug!(path, error = %err, "open rejected");
            Err(match err {
                ArchiveError::OutOfMemory => codes::E_NO_MEMORY,
                _ => codes::E_EOPEN,
            })
        }
    }
}

/// Single-pass enumeration of the one entry
pub fn read_header(token: Token) -> Result<EntryMetadata, i32> {
    let mut registry = registry();
    let session = registry.sessions.get_mut(&token).ok_or(codes::E_EABORTED)?;
    session.handle.read_metadata().map_err(|err| err.host_code())
}

/// Skip, test or extract the entry of an open archive
pub fn process_file(token: Token, operation: i32, destination: Option<&str>) -> i32 {
    // Run without the registry lock so a callback may call back into the plug-in
    let Some(mut session) = registry().check_out(token) else {
        return codes::E_BAD_ARCHIVE;
    };

    let result = match ProcessOp::from_code(operation) {
        Some(op) => session.handle.process(op, destination.map(Path::new)),
        None => Err(ArchiveError::NotSupported(format!("operation {}", operation))),
    };

    registry().check_in(token, session);

    match result {
        Ok(_) => codes::SUCCESS,
        Err(err) => {
            tracing::warn!(token, error = %err, "process failed");
            err.host_code()
        }
    }
}

/// Release everything an open archive holds
pub fn close_archive(token: Token) -> i32 {
    match registry().sessions.remove(&token) {
        Some(session) => {
            session.handle.close();
            codes::SUCCESS
        }
        None => codes::E_ECLOSE,
    }
}

/// Open-then-close probe
pub fn can_handle(path: &str) -> bool {
    match open_archive(path) {
        Ok(token) => close_archive(token) == codes::SUCCESS,
        Err(_) => false,
    }
}

/// Register a progress callback for an archive, or for packing with [`DEFAULT_TOKEN`].
///
/// A registration made from inside a progress callback of that archive takes
/// effect when the running process call returns.
pub fn set_process_data_proc(token: Token, registration: CallbackRegistration) {
    if token == DEFAULT_TOKEN {
        registration.apply(&mut host_config().default_callbacks);
        return;
    }

    let mut registry = registry();
    if let Some(session) = registry.sessions.get_mut(&token) {
        registration.apply(&mut session.callbacks);
        let gate = session.callbacks.to_gate();
        session.handle.set_progress_gate(gate);
    } else if let Some(pending) = registry.busy.get_mut(&token) {
        pending.push(registration);
    }
}

/// Remember where the host keeps its settings
pub fn set_default_params(host_settings_file: &str) {
    let path = settings_path_for(Path::new(host_settings_file));
    tracing::debug!(path = %path.display(), "settings location");
    host_config().settings_path = Some(path);
}

/// Compression settings currently in effect for pack calls
pub fn current_settings() -> Settings {
    let path = host_config().settings_path.clone();
    path.map(|p| Settings::load(&p)).unwrap_or_default()
}

/// Pack exactly one item from `source_dir` into `archive`
pub fn pack_files(archive: &str, source_dir: &str, items: &[String], _flags: i32) -> i32 {
    if let Err(err) = single_item(items) {
        return err.host_code();
    }

    let options = PackOptions::with_level(current_settings().level());
    let mut gate = host_config().default_callbacks.to_gate();

    match pack_file(Path::new(archive), Path::new(source_dir), items, &options, &mut gate) {
        Ok(_) => codes::SUCCESS,
        Err(err) => {
            tracing::warn!(archive, error = %err, "pack failed");
            err.host_code()
        }
    }
}
