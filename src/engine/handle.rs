use std::sync::{Arc, PoisonError, RwLock};

use super::NativeEngine;
use crate::config::EngineSettings;

/// Where an engine is in its asynchronous start-up.
pub enum Readiness<E> {
    Loading,
    Ready(Arc<E>),
    Failed(String),
}

/// Readiness without the engine itself, for display and comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Shared, cloneable view of an engine's readiness. Pipelines and shells hold
/// one of these instead of reaching for a global.
pub struct EngineHandle<E> {
    state: Arc<RwLock<Readiness<E>>>,
}

impl<E> Clone for EngineHandle<E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<E> EngineHandle<E> {
    pub fn loading() -> Self {
        Self {
            state: Arc::new(RwLock::new(Readiness::Loading)),
        }
    }

    pub fn ready(engine: E) -> Self {
        Self {
            state: Arc::new(RwLock::new(Readiness::Ready(Arc::new(engine)))),
        }
    }

    /// The engine, if it has finished loading.
    pub fn engine(&self) -> Option<Arc<E>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            Readiness::Ready(engine) => Some(Arc::clone(engine)),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.engine().is_some()
    }

    pub fn status(&self) -> EngineStatus {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            Readiness::Loading => EngineStatus::Loading,
            Readiness::Ready(_) => EngineStatus::Ready,
            Readiness::Failed(reason) => EngineStatus::Failed(reason.clone()),
        }
    }

    pub fn set_ready(&self, engine: E) {
        self.set(Readiness::Ready(Arc::new(engine)));
    }

    pub fn set_failed(&self, reason: impl Into<String>) {
        self.set(Readiness::Failed(reason.into()));
    }

    fn set(&self, readiness: Readiness<E>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = readiness;
    }
}

/// Starts loading a [`NativeEngine`] on the runtime's blocking pool and returns
/// a handle that is `Loading` until it settles. `on_settled` runs once the
/// handle has flipped to `Ready` or `Failed`.
pub fn load_in_background<F>(
    runtime: &tokio::runtime::Handle,
    settings: EngineSettings,
    on_settled: F,
) -> EngineHandle<NativeEngine>
where
    F: FnOnce() + Send + 'static,
{
    let handle = EngineHandle::loading();
    let slot = handle.clone();

    runtime.spawn(async move {
        let loaded = tokio::task::spawn_blocking(move || NativeEngine::load(&settings)).await;
        match loaded {
            Ok(Ok(engine)) => {
                log::info!("processing engine ready");
                slot.set_ready(engine);
            }
            Ok(Err(e)) => {
                log::warn!("processing engine failed to load: {}", e);
                slot.set_failed(e.to_string());
            }
            Err(e) => {
                log::warn!("processing engine loader did not finish: {}", e);
                slot.set_failed(e.to_string());
            }
        }
        on_settled();
    });

    handle
}
