//! Logging infrastructure for freshfood
//!
//! Logs to ~/.freshfood/logs/ with one file per day. Nothing is written until
//! `init()` has been called, so library users and tests stay silent.
//!
//! Supports thread-local (or task-local, inside tokio) context for the active
//! flow and endpoint.

use crate::storage::freshfood_dir;
use chrono::Local;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);
static TASK_LOG_CONTEXTS: OnceLock<Mutex<HashMap<String, LogContext>>> = OnceLock::new();

/// Thread-local logging context
#[derive(Default, Clone)]
struct LogContext {
    flow: Option<String>,
    endpoint: Option<String>,
}

thread_local! {
    static LOG_CONTEXT: RefCell<LogContext> = RefCell::new(LogContext::default());
}

/// Update just the flow in the current context
fn set_flow(flow: &str) {
    if with_task_context_mut(|ctx| {
        ctx.flow = Some(flow.to_string());
    }) {
        return;
    }

    LOG_CONTEXT.with(|c| {
        c.borrow_mut().flow = Some(flow.to_string());
    });
}

/// Update just the endpoint in the current context
pub fn set_endpoint(endpoint: &str) {
    if with_task_context_mut(|ctx| {
        ctx.endpoint = Some(endpoint.to_string());
    }) {
        return;
    }

    LOG_CONTEXT.with(|c| {
        c.borrow_mut().endpoint = Some(endpoint.to_string());
    });
}

/// Flow context held for the duration of one operation.
///
/// Dropping it clears the context, including the task entry kept for tokio
/// tasks.
pub struct FlowScope {
    _private: (),
}

impl Drop for FlowScope {
    fn drop(&mut self) {
        clear_context();
    }
}

/// Tag log lines from the current thread or task with `flow` until the
/// returned scope is dropped.
pub fn enter_flow(flow: &str) -> FlowScope {
    set_flow(flow);
    FlowScope { _private: () }
}

/// Clear the logging context for the current thread
fn clear_context() {
    if let Some(task_id) = current_task_id() {
        if let Some(store) = TASK_LOG_CONTEXTS.get() {
            if let Ok(mut contexts) = store.lock() {
                contexts.remove(&task_id);
            }
        }
    }

    LOG_CONTEXT.with(|c| {
        *c.borrow_mut() = LogContext::default();
    });
}

/// Get the current context as a prefix string
fn context_prefix() -> String {
    if let Some(task_ctx) = task_context_snapshot() {
        return context_prefix_for(&task_ctx);
    }

    LOG_CONTEXT.with(|c| context_prefix_for(&c.borrow()))
}

fn current_task_id() -> Option<String> {
    tokio::task::try_id().map(|id| id.to_string())
}

fn with_task_context_mut(update: impl FnOnce(&mut LogContext)) -> bool {
    let Some(task_id) = current_task_id() else {
        return false;
    };

    let store = TASK_LOG_CONTEXTS.get_or_init(|| Mutex::new(HashMap::new()));
    if let Ok(mut contexts) = store.lock() {
        let ctx = contexts.entry(task_id).or_default();
        update(ctx);
        true
    } else {
        false
    }
}

fn task_context_snapshot() -> Option<LogContext> {
    let task_id = current_task_id()?;
    let store = TASK_LOG_CONTEXTS.get()?;
    let contexts = store.lock().ok()?;
    contexts.get(&task_id).cloned()
}

fn context_prefix_for(ctx: &LogContext) -> String {
    let mut parts = Vec::new();

    if let Some(ref flow) = ctx.flow {
        parts.push(format!("flow:{}", flow));
    }
    if let Some(ref endpoint) = ctx.endpoint {
        parts.push(format!("ep:{}", endpoint));
    }

    if parts.is_empty() {
        String::new()
    } else {
        format!("[{}] ", parts.join("|"))
    }
}

pub struct Logger {
    file: File,
}

impl Logger {
    fn new() -> Option<Self> {
        let log_dir = log_dir()?;
        fs::create_dir_all(&log_dir).ok()?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path()?)
            .ok()?;

        Some(Self { file })
    }

    fn write(&mut self, level: &str, message: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let ctx = context_prefix();
        let line = format!("[{}] [{}] {}{}\n", timestamp, level, ctx, message);
        let _ = self.file.write_all(line.as_bytes());
        let _ = self.file.flush();
    }
}

fn emit(level: &str, message: &str) {
    if let Ok(mut guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_mut() {
            logger.write(level, message);
        }
    }
}

/// Initialize the logger (call once at startup)
pub fn init() {
    if let Ok(mut guard) = LOGGER.lock() {
        if guard.is_none() {
            *guard = Logger::new();
        }
    }
}

/// Log an info message
pub fn info(message: &str) {
    emit("INFO", message);
}

/// Log an error message
pub fn error(message: &str) {
    emit("ERROR", message);
}

/// Log a warning message
pub fn warn(message: &str) {
    emit("WARN", message);
}

/// Log a debug message (only if FRESHFOOD_TRACE is set)
pub fn debug(message: &str) {
    if std::env::var("FRESHFOOD_TRACE").is_ok() {
        emit("DEBUG", message);
    }
}

/// Log one HTTP exchange. `status` is `None` when no response arrived.
pub fn request(method: &str, url: &str, status: Option<u16>, elapsed: Duration, detail: &str) {
    let status = status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "---".to_string());
    let msg = format!(
        "HTTP {} {} -> {} in {}ms {}",
        method,
        url,
        status,
        elapsed.as_millis(),
        truncate(detail, 500)
    );
    emit("HTTP", msg.trim_end());
}

fn log_dir() -> Option<PathBuf> {
    freshfood_dir().ok().map(|d| d.join("logs"))
}

/// Get path to today's log file
fn log_path() -> Option<PathBuf> {
    let date = Local::now().format("%Y-%m-%d");
    Some(log_dir()?.join(format!("freshfood-{}.log", date)))
}

/// Clean up old logs (keep last 7 days)
pub fn cleanup_old_logs() {
    if let Some(log_dir) = log_dir() {
        if let Ok(entries) = fs::read_dir(&log_dir) {
            let cutoff = Local::now() - chrono::Duration::days(7);
            for entry in entries.flatten() {
                if let Ok(metadata) = entry.metadata() {
                    if let Ok(modified) = metadata.modified() {
                        let modified: chrono::DateTime<Local> = modified.into();
                        if modified < cutoff {
                            let _ = fs::remove_file(entry.path());
                        }
                    }
                }
            }
        }
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
