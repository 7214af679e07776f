// The `on_*` methods do only trivial work (buffer a value, then hand off to
// the mutator channel), so they are safe to call from input threads and
// `async` tasks alike. All head and state mutations happen on the mutator
// thread; all participant expansion happens on the aggregator thread.

use core::{any::Any, panic::AssertUnwindSafe};
use std::{
    sync::{
        mpsc::{self, Sender},
        Arc,
    },
    thread::{Builder, JoinHandle},
};

use anyhow::{anyhow, Context as _, Result};
use arc_swap::ArcSwapOption;
use futures::{channel::mpsc::UnboundedReceiver, select, StreamExt as _};
use log::warn;
use std_ext::ArcExt as _;
use thiserror::Error;

use types::{config::Config, containers::Attestation, primitives::Slot};

use crate::{
    aggregator::Aggregator,
    attestation_pool::AttestationPool,
    events::{EventChannels, ReplayReceiver},
    messages::MutatorMessage,
    misc::{BeaconTupleDetails, ChainHead, ObservableBeaconState},
    mutator::Mutator,
    pending_operations::PendingOperations,
    traits::{HeadFunction, StateTransition, TupleStorage},
    tuple_cache::TupleCache,
};

/// The input streams the subsystem subscribes to.
pub struct InputStreams {
    pub slot_ticks: UnboundedReceiver<Slot>,
    pub attestations: UnboundedReceiver<Arc<Attestation>>,
    pub block_tuples: UnboundedReceiver<BeaconTupleDetails>,
}

pub struct Controller {
    pool: Arc<AttestationPool>,
    tuple_cache: Arc<TupleCache>,
    channels: Arc<EventChannels>,
    mutator_tx: Sender<MutatorMessage>,
    aggregator_stop_tx: Sender<()>,
}

impl Drop for Controller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl Controller {
    /// Builds the processor and spawns both of its worker threads.
    pub fn new<T, H, S>(
        config: Arc<Config>,
        transition: T,
        head_function: H,
        storage: S,
        channels: Arc<EventChannels>,
    ) -> Result<(Arc<Self>, ControllerHandle)>
    where
        T: StateTransition,
        H: HeadFunction,
        S: TupleStorage,
    {
        let pool = Arc::new(AttestationPool::default());
        let tuple_cache = Arc::new(TupleCache::default());
        let latest_state = Arc::new(ArcSwapOption::empty());
        let (mutator_tx, mutator_rx) = mpsc::channel();
        let (aggregator_stop_tx, aggregator_stop_rx) = mpsc::channel();

        let mutator = Mutator::new(
            config.clone_arc(),
            transition,
            head_function,
            storage,
            pool.clone_arc(),
            tuple_cache.clone_arc(),
            channels.clone_arc(),
            latest_state.clone_arc(),
            mutator_rx,
        );

        let mutator_thread = Builder::new()
            .name("observable-state-mutator".to_owned())
            .spawn(move || {
                // The mutator's state cannot be observed after a panic, so
                // the closure is unwind safe.
                std::panic::catch_unwind(AssertUnwindSafe(move || mutator.run()))
                    .map_err(payload_into_error)
                    .context(Error::MutatorPanicked)?
                    .context(Error::MutatorFailed)
            })?;

        let aggregator = Aggregator::new(
            config,
            pool.clone_arc(),
            latest_state,
            aggregator_stop_rx,
        );

        let aggregator_thread = Builder::new()
            .name("attestation-aggregator".to_owned())
            .spawn(move || {
                if std::panic::catch_unwind(AssertUnwindSafe(move || aggregator.run())).is_err() {
                    warn!("attestation aggregator exited after a panic");
                }
            })?;

        let controller = Arc::new(Self {
            pool,
            tuple_cache,
            channels,
            mutator_tx: mutator_tx.clone(),
            aggregator_stop_tx: aggregator_stop_tx.clone(),
        });

        let handle = ControllerHandle {
            mutator: Some(mutator_thread),
            aggregator: Some(aggregator_thread),
            mutator_tx,
            aggregator_stop_tx,
        };

        Ok((controller, handle))
    }

    pub fn on_tick(&self, slot: Slot) {
        MutatorMessage::Tick { slot }.send(&self.mutator_tx);
    }

    pub fn on_gossip_attestation(&self, attestation: Arc<Attestation>) {
        self.pool.offer(attestation);
    }

    pub fn on_block_imported(&self, details: BeaconTupleDetails) {
        self.tuple_cache.insert(details.clone());
        MutatorMessage::BlockImported { details }.send(&self.mutator_tx);
    }

    /// Forwards the input streams to the corresponding entry points.
    /// Resolves once every input stream has ended.
    pub async fn route_inputs(&self, inputs: InputStreams) {
        let InputStreams {
            mut slot_ticks,
            mut attestations,
            mut block_tuples,
        } = inputs;

        loop {
            select! {
                slot = slot_ticks.select_next_some() => self.on_tick(slot),
                attestation = attestations.select_next_some() => {
                    self.on_gossip_attestation(attestation);
                }
                details = block_tuples.select_next_some() => self.on_block_imported(details),
                complete => break,
            }
        }
    }

    #[must_use]
    pub fn subscribe_to_heads(&self) -> ReplayReceiver<ChainHead> {
        self.channels.heads.subscribe()
    }

    #[must_use]
    pub fn subscribe_to_observable_states(&self) -> ReplayReceiver<ObservableBeaconState> {
        self.channels.observable_states.subscribe()
    }

    #[must_use]
    pub fn subscribe_to_pending_operations(&self) -> ReplayReceiver<PendingOperations> {
        self.channels.pending_operations.subscribe()
    }

    /// Shuts down both worker threads. Idempotent.
    pub fn stop(&self) {
        MutatorMessage::Stop.send(&self.mutator_tx);
        drop(self.aggregator_stop_tx.send(()));
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &AttestationPool {
        &self.pool
    }

    #[cfg(test)]
    pub(crate) fn tuple_cache(&self) -> &TupleCache {
        &self.tuple_cache
    }
}

/// Joins the worker threads and surfaces the mutator's terminal error.
///
/// Dropping the handle joins implicitly and panics if the mutator failed;
/// call [`ControllerHandle::join`] to inspect the error instead.
pub struct ControllerHandle {
    mutator: Option<JoinHandle<Result<()>>>,
    aggregator: Option<JoinHandle<()>>,
    mutator_tx: Sender<MutatorMessage>,
    aggregator_stop_tx: Sender<()>,
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        self.stop();

        let result = self.join_internal();

        if !std::thread::panicking() {
            result.expect("mutator thread should succeed when joined implicitly");
        }
    }
}

impl ControllerHandle {
    pub fn join(mut self) -> Result<()> {
        self.stop();
        self.join_internal()
    }

    fn stop(&self) {
        MutatorMessage::Stop.send(&self.mutator_tx);
        drop(self.aggregator_stop_tx.send(()));
    }

    fn join_internal(&mut self) -> Result<()> {
        let result = match self.mutator.take() {
            Some(join_handle) => join_handle
                .join()
                .expect("mutator thread handles panics internally"),
            None => Ok(()),
        };

        if let Some(join_handle) = self.aggregator.take() {
            join_handle
                .join()
                .expect("aggregator thread handles panics internally");
        }

        result
    }
}

fn payload_into_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    if let Some(message) = payload.downcast_ref::<&str>() {
        anyhow!("{message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        anyhow!("{message}")
    } else {
        anyhow!("mutator panicked with a non-string payload")
    }
}

#[derive(Debug, Error)]
enum Error {
    #[error("mutator panicked")]
    MutatorPanicked,
    #[error("mutator failed")]
    MutatorFailed,
}
