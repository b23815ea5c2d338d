//! Backend selection
//!
//! Every capability (platform/windowing, graphics, audio) has an ordered
//! list of interchangeable implementations, most capable first. Selection
//! walks the list once at initialization and keeps the first backend whose
//! availability probe succeeds. Each list ends with a `null` backend whose
//! probe always succeeds, so in practice selection cannot fail.

use thiserror::Error;

/// Backend selection errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// No candidate passed its availability probe
    #[error("no {capability} backend available (tried: {tried})")]
    NoneAvailable {
        /// Capability being selected
        capability: &'static str,
        /// Comma separated candidate names, in probe order
        tried: String,
    },
}

/// Common surface of every interchangeable backend
pub trait Backend {
    /// Short backend name used in configuration and logs
    fn name(&self) -> &'static str;

    /// Check whether this backend can run here
    ///
    /// Must not leave anything behind: any resource opened to check
    /// availability is closed before returning.
    fn probe(&self) -> bool;
}

/// Pick the first available backend from `candidates`
///
/// When `preferred` names one of the candidates it is probed first; the
/// remaining candidates keep their order. An unknown preferred name is
/// logged and ignored.
pub fn select_backend<B: Backend + ?Sized>(
    capability: &'static str,
    mut candidates: Vec<Box<B>>,
    preferred: Option<&str>,
) -> Result<Box<B>, BackendError> {
    if let Some(name) = preferred {
        match candidates.iter().position(|candidate| candidate.name() == name) {
            Some(index) => {
                let candidate = candidates.remove(index);
                candidates.insert(0, candidate);
            }
            None => log::warn!(
                "Preferred {} backend '{}' is not compiled in, using default order",
                capability,
                name
            ),
        }
    }

    let tried: Vec<&'static str> = candidates.iter().map(|candidate| candidate.name()).collect();

    for candidate in candidates {
        if candidate.probe() {
            log::info!("Selected {} backend: {}", capability, candidate.name());
            return Ok(candidate);
        }
        log::debug!("{} backend '{}' unavailable", capability, candidate.name());
    }

    let error = BackendError::NoneAvailable {
        capability,
        tried: tried.join(", "),
    };
    log::error!("{}", error);
    Err(error)
}
