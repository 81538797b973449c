//! Out-of-band warning channel standing in for an editor's transaction log.
//!
//! Decode/encode operations that hit a recoverable oddity (a stray padding
//! byte, a deprecated flag combination) report it here instead of failing
//! outright. Callers that don't care can pass [`NullDiagnostics`].

/// Severity of a reported message, mirroring the three non-fatal buckets a
/// caller might want to filter or escalate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoMessageClass {
    Info,
    Warning,
    Error,
}

/// Sink for non-fatal messages produced while decoding or encoding an
/// archive. `domain` names the component (`"szs"`, `"mat"`, `"tev"`, ...),
/// `body` is a human-readable description.
pub trait Diagnostics {
    fn report(&mut self, level: IoMessageClass, domain: &str, body: &str);
}

/// Discards every message. Used by callers that only want the `Result`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnostics;

impl Diagnostics for NullDiagnostics {
    fn report(&mut self, _level: IoMessageClass, _domain: &str, _body: &str) {}
}

/// Forwards every message to the `log` facade at a matching level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&mut self, level: IoMessageClass, domain: &str, body: &str) {
        match level {
            IoMessageClass::Info => log::info!("[{domain}] {body}"),
            IoMessageClass::Warning => log::warn!("[{domain}] {body}"),
            IoMessageClass::Error => log::error!("[{domain}] {body}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Collector(Vec<(IoMessageClass, String)>);

    impl Diagnostics for Collector {
        fn report(&mut self, level: IoMessageClass, domain: &str, body: &str) {
            self.0.push((level, format!("[{domain}] {body}")));
        }
    }

    #[test]
    fn collector_records_messages() {
        let mut c = Collector(Vec::new());
        c.report(IoMessageClass::Warning, "szs", "short match ignored");
        assert_eq!(c.0.len(), 1);
        assert_eq!(c.0[0].0, IoMessageClass::Warning);
        assert!(c.0[0].1.contains("short match ignored"));
    }

    #[test]
    fn null_diagnostics_is_silent() {
        let mut n = NullDiagnostics;
        n.report(IoMessageClass::Error, "mat", "ignored");
    }
}
