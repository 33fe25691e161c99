//! Delivery targets for loaded indexes.
//!
//! A loader hands every index it produces to exactly one
//! [`ImplementorSink::accept`] call. The sink decides what delivery means:
//! collecting, forwarding to a closure, or the hook-or-pending handoff of
//! [`RegistrationChannel`].

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::SinkError;
use crate::index::ImplementorIndex;
use crate::trait_path::TraitPath;

/// An index together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedIndex {
    /// Trait the index documents, when known from the file location.
    pub trait_path: Option<TraitPath>,

    /// File the index was read from.
    pub source: Option<PathBuf>,

    /// The index itself.
    pub index: ImplementorIndex,
}

impl LoadedIndex {
    /// An index with no known origin.
    pub fn anonymous(index: ImplementorIndex) -> Self {
        Self {
            trait_path: None,
            source: None,
            index,
        }
    }

    /// Trait path as a display label, if known.
    pub fn label(&self) -> Option<String> {
        self.trait_path.as_ref().map(ToString::to_string)
    }
}

/// Receiver of loaded indexes.
pub trait ImplementorSink {
    /// Take ownership of one loaded index.
    fn accept(&mut self, loaded: LoadedIndex) -> Result<(), SinkError>;
}

impl<F> ImplementorSink for F
where
    F: FnMut(LoadedIndex) -> Result<(), SinkError>,
{
    fn accept(&mut self, loaded: LoadedIndex) -> Result<(), SinkError> {
        self(loaded)
    }
}

/// Keeps every delivered index in delivery order.
#[derive(Debug, Default)]
pub struct CollectSink {
    delivered: Vec<LoadedIndex>,
}

impl CollectSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> &[LoadedIndex] {
        &self.delivered
    }

    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }

    pub fn into_inner(self) -> Vec<LoadedIndex> {
        self.delivered
    }
}

impl ImplementorSink for CollectSink {
    fn accept(&mut self, loaded: LoadedIndex) -> Result<(), SinkError> {
        self.delivered.push(loaded);
        Ok(())
    }
}

/// Callback that receives an index from a [`RegistrationChannel`].
pub type RegistrationHook = Box<dyn FnMut(ImplementorIndex) -> Result<(), SinkError> + Send>;

/// Hook-or-pending handoff.
///
/// With a hook installed, each accepted index is passed to the hook and the
/// pending slot is not touched. Without one, the index is parked in the
/// pending slot (replacing whatever was there) until a consumer takes it.
#[derive(Default)]
pub struct RegistrationChannel {
    hook: Option<RegistrationHook>,
    pending: Option<ImplementorIndex>,
    hook_calls: usize,
}

impl RegistrationChannel {
    /// A channel with no hook and an empty pending slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// A channel that forwards to `hook`.
    pub fn with_hook<F>(hook: F) -> Self
    where
        F: FnMut(ImplementorIndex) -> Result<(), SinkError> + Send + 'static,
    {
        Self {
            hook: Some(Box::new(hook)),
            ..Self::default()
        }
    }

    /// Pre-fill the pending slot.
    pub fn with_pending(mut self, index: ImplementorIndex) -> Self {
        self.pending = Some(index);
        self
    }

    pub fn has_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Install a hook, first handing it any index already waiting in the
    /// pending slot.
    ///
    /// Returns whether a pending index was delivered. If the hook rejects
    /// the pending index, the index stays pending and the hook is still
    /// installed.
    pub fn install_hook<F>(&mut self, hook: F) -> Result<bool, SinkError>
    where
        F: FnMut(ImplementorIndex) -> Result<(), SinkError> + Send + 'static,
    {
        let mut hook: RegistrationHook = Box::new(hook);
        let delivered = match self.pending.take() {
            Some(index) => {
                self.hook_calls += 1;
                if let Err(err) = hook(index.clone()) {
                    self.pending = Some(index);
                    self.hook = Some(hook);
                    return Err(err);
                }
                true
            }
            None => false,
        };
        self.hook = Some(hook);
        Ok(delivered)
    }

    /// Remove the hook; later indexes go to the pending slot.
    pub fn remove_hook(&mut self) -> Option<RegistrationHook> {
        self.hook.take()
    }

    /// Index waiting for pickup.
    pub fn pending(&self) -> Option<&ImplementorIndex> {
        self.pending.as_ref()
    }

    /// Pick up the waiting index, emptying the slot.
    pub fn take_pending(&mut self) -> Option<ImplementorIndex> {
        self.pending.take()
    }

    /// Number of times the hook has been invoked.
    pub fn hook_calls(&self) -> usize {
        self.hook_calls
    }
}

impl ImplementorSink for RegistrationChannel {
    fn accept(&mut self, loaded: LoadedIndex) -> Result<(), SinkError> {
        match self.hook.as_mut() {
            Some(hook) => {
                self.hook_calls += 1;
                trace!(trait_path = ?loaded.label(), "invoking registration hook");
                hook(loaded.index)
            }
            None => {
                debug!(trait_path = ?loaded.label(), "no hook installed, index left pending");
                self.pending = Some(loaded.index);
                Ok(())
            }
        }
    }
}

impl fmt::Debug for RegistrationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationChannel")
            .field("has_hook", &self.hook.is_some())
            .field("pending", &self.pending)
            .field("hook_calls", &self.hook_calls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn sample() -> ImplementorIndex {
        let mut index = ImplementorIndex::new();
        index.insert("a", vec![]).unwrap();
        index.insert("b", vec!["<impl X>".to_string()]).unwrap();
        index
    }

    #[test]
    fn test_without_hook_index_is_pending() {
        let mut channel = RegistrationChannel::new();
        channel.accept(LoadedIndex::anonymous(sample())).unwrap();

        assert_eq!(channel.pending(), Some(&sample()));
        assert_eq!(channel.hook_calls(), 0);
        assert_eq!(channel.take_pending(), Some(sample()));
        assert!(channel.pending().is_none());
    }

    #[test]
    fn test_with_hook_pending_untouched() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let mut prior = ImplementorIndex::new();
        prior.insert("old", vec![]).unwrap();

        let mut channel = RegistrationChannel::with_hook(move |index| {
            sink.lock().unwrap().push(index);
            Ok(())
        })
        .with_pending(prior.clone());

        channel.accept(LoadedIndex::anonymous(sample())).unwrap();

        assert_eq!(channel.hook_calls(), 1);
        assert_eq!(*received.lock().unwrap(), vec![sample()]);
        assert_eq!(channel.pending(), Some(&prior));
    }

    #[test]
    fn test_hook_error_propagates() {
        let mut channel = RegistrationChannel::with_hook(|_| Err("viewer crashed".into()));
        let err = channel.accept(LoadedIndex::anonymous(sample())).unwrap_err();
        assert_eq!(err.to_string(), "viewer crashed");
        assert_eq!(channel.hook_calls(), 1);
        assert!(channel.pending().is_none());
    }

    #[test]
    fn test_install_hook_drains_pending() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let mut channel = RegistrationChannel::new();
        channel.accept(LoadedIndex::anonymous(sample())).unwrap();

        let delivered = channel
            .install_hook(move |index| {
                sink.lock().unwrap().push(index);
                Ok(())
            })
            .unwrap();

        assert!(delivered);
        assert!(channel.pending().is_none());
        assert_eq!(*received.lock().unwrap(), vec![sample()]);
    }

    #[test]
    fn test_install_hook_failure_keeps_pending() {
        let mut channel = RegistrationChannel::new().with_pending(sample());
        let result = channel.install_hook(|_| Err("not ready".into()));
        assert!(result.is_err());
        assert!(channel.has_hook());
        assert_eq!(channel.pending(), Some(&sample()));
    }

    #[test]
    fn test_remove_hook_falls_back_to_pending() {
        let mut channel = RegistrationChannel::with_hook(|_| Ok(()));
        assert!(channel.remove_hook().is_some());
        channel.accept(LoadedIndex::anonymous(sample())).unwrap();
        assert_eq!(channel.pending(), Some(&sample()));
    }

    #[test]
    fn test_closure_sink() {
        let mut count = 0;
        let mut sink = |loaded: LoadedIndex| -> Result<(), SinkError> {
            count += loaded.index.len();
            Ok(())
        };
        sink.accept(LoadedIndex::anonymous(sample())).unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_collect_sink_keeps_order() {
        let mut sink = CollectSink::new();
        let mut first = ImplementorIndex::new();
        first.insert("first", vec![]).unwrap();
        sink.accept(LoadedIndex::anonymous(first.clone())).unwrap();
        sink.accept(LoadedIndex::anonymous(sample())).unwrap();

        assert_eq!(sink.len(), 2);
        let delivered = sink.into_inner();
        assert_eq!(delivered[0].index, first);
        assert_eq!(delivered[1].index, sample());
    }
}
