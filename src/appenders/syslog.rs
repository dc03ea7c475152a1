//! Syslog appender
//!
//! Sends RFC 3164 framed messages to a local or remote syslog daemon through
//! the `syslog` crate. Remote targets are reached over UDP or TCP; local
//! daemons over a unix socket. With no network configured the usual local
//! socket paths are probed.

use crate::core::appender::{Appender, Closable};
use crate::core::error::{LoggerError, Result};
use crate::core::log_level::LogLevel;
use crate::core::output_format::OutputFormat;
use crate::core::record::Record;
use parking_lot::Mutex;
use std::io::Write;
use std::time::Duration;
use ::syslog::{Formatter3164, Logger, LoggerBackend};

pub use ::syslog::Facility;

const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// Facility used when none is configured
pub const DEFAULT_FACILITY: Facility = Facility::LOG_LOCAL7;

type SyslogLogger = Logger<LoggerBackend, Formatter3164>;

/// Resolve a configured facility name such as `daemon` or `local7`
pub fn parse_facility(name: &str) -> Result<Facility> {
    let facility = match name.trim().to_lowercase().as_str() {
        "kern" => Facility::LOG_KERN,
        "user" => Facility::LOG_USER,
        "mail" => Facility::LOG_MAIL,
        "daemon" => Facility::LOG_DAEMON,
        "auth" => Facility::LOG_AUTH,
        "syslog" => Facility::LOG_SYSLOG,
        "lpr" => Facility::LOG_LPR,
        "news" => Facility::LOG_NEWS,
        "uucp" => Facility::LOG_UUCP,
        "cron" => Facility::LOG_CRON,
        "authpriv" => Facility::LOG_AUTHPRIV,
        "ftp" => Facility::LOG_FTP,
        "local0" => Facility::LOG_LOCAL0,
        "local1" => Facility::LOG_LOCAL1,
        "local2" => Facility::LOG_LOCAL2,
        "local3" => Facility::LOG_LOCAL3,
        "local4" => Facility::LOG_LOCAL4,
        "local5" => Facility::LOG_LOCAL5,
        "local6" => Facility::LOG_LOCAL6,
        "local7" => Facility::LOG_LOCAL7,
        other => {
            return Err(LoggerError::config(
                "syslog",
                format!("unknown facility '{}'", other),
            ))
        }
    };
    Ok(facility)
}

/// Syslog sink
///
/// # Example
///
/// ```no_run
/// use rust_log_registry::appenders::syslog::{SyslogAppender, DEFAULT_FACILITY};
/// use rust_log_registry::OutputFormat;
///
/// let appender = SyslogAppender::connect("udp", "127.0.0.1:514", DEFAULT_FACILITY, "myapp", OutputFormat::Text)
///     .expect("Failed to reach syslog");
/// ```
pub struct SyslogAppender {
    address: String,
    tag: String,
    output_format: OutputFormat,
    logger: Mutex<Option<SyslogLogger>>,
}

impl std::fmt::Debug for SyslogAppender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyslogAppender")
            .field("address", &self.address)
            .field("tag", &self.tag)
            .field("output_format", &self.output_format)
            .finish_non_exhaustive()
    }
}

impl SyslogAppender {
    /// Connect to a syslog daemon.
    ///
    /// `network` is one of `udp`, `tcp`, `unix`, `unixgram`, or empty for
    /// the local daemon. An empty `tag` falls back to the process name.
    /// `format` renders the message part after the syslog header.
    ///
    /// # Errors
    ///
    /// Returns error if the network is unknown or the daemon cannot be reached
    pub fn connect(
        network: &str,
        address: &str,
        facility: Facility,
        tag: &str,
        format: OutputFormat,
    ) -> Result<Self> {
        let remote = matches!(network, "udp" | "udp4" | "udp6" | "tcp" | "tcp4" | "tcp6");

        let defaults = Formatter3164::default();
        let formatter = Formatter3164 {
            facility,
            // Local daemons stamp the hostname themselves
            hostname: if remote { defaults.hostname } else { None },
            process: if tag.is_empty() {
                defaults.process
            } else {
                tag.to_string()
            },
            pid: defaults.pid,
        };
        let tag = formatter.process.clone();

        let fail = |e: syslog::Error| LoggerError::syslog(address, e.to_string());
        let logger = match network {
            "udp" | "udp4" | "udp6" => {
                let bind = if network == "udp6" { "[::]:0" } else { "0.0.0.0:0" };
                syslog::udp(formatter, bind, address).map_err(fail)?
            }
            "tcp" | "tcp4" | "tcp6" => syslog::tcp(formatter, address).map_err(fail)?,
            "unix" | "unixgram" => syslog::unix_custom(formatter, address).map_err(fail)?,
            "" => syslog::unix(formatter).map_err(fail)?,
            other => {
                return Err(LoggerError::config(
                    "syslog",
                    format!("unsupported network '{}'", other),
                ))
            }
        };

        if let Err(e) = bound_writes(&logger.backend) {
            eprintln!("[WARN] Failed to set syslog write timeout: {}", e);
        }

        Ok(Self {
            address: if network.is_empty() {
                "local".to_string()
            } else {
                address.to_string()
            },
            tag,
            output_format: format,
            logger: Mutex::new(Some(logger)),
        })
    }

    /// Message part: the record without its timestamp, the header has one
    fn body(&self, record: &Record) -> Result<String> {
        let mut body = record.clone();
        body.timestamp = None;
        self.output_format.format(&body, false)
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }
}

fn bound_writes(backend: &LoggerBackend) -> std::io::Result<()> {
    match backend {
        LoggerBackend::Udp(socket, _) => socket.set_write_timeout(Some(WRITE_TIMEOUT)),
        LoggerBackend::Tcp(stream) => stream.get_ref().set_write_timeout(Some(WRITE_TIMEOUT)),
        _ => Ok(()),
    }
}

impl Appender for SyslogAppender {
    fn append(&self, record: &Record) -> Result<()> {
        let message = self.body(record)?;

        let mut guard = self.logger.lock();
        let logger = guard
            .as_mut()
            .ok_or_else(|| LoggerError::closed(format!("syslog {}", self.address)))?;

        let sent = match record.level.unwrap_or(LogLevel::Info) {
            LogLevel::Trace | LogLevel::Debug => logger.debug(message),
            LogLevel::Info => logger.info(message),
            LogLevel::Warn => logger.warning(message),
            LogLevel::Error => logger.err(message),
            LogLevel::Critical => logger.crit(message),
        };
        sent.map_err(|e| LoggerError::syslog(&self.address, e.to_string()))?;

        // Stream backends buffer; each record goes out before append returns
        logger
            .backend
            .flush()
            .map_err(|e| LoggerError::syslog(&self.address, e.to_string()))
    }

    fn name(&self) -> &str {
        "syslog"
    }
}

impl Closable for SyslogAppender {
    fn close(&self) -> Result<()> {
        if let Some(mut logger) = self.logger.lock().take() {
            logger
                .backend
                .flush()
                .map_err(|e| LoggerError::syslog(&self.address, e.to_string()))?;
        }
        Ok(())
    }
}
