// `Mutator::run` executes in a dedicated background thread and is the only
// writer of the head and latest-state fields, so updates to them are
// linearly ordered without locks. Work arriving while a state projection is
// in progress simply queues behind it.

use std::sync::{mpsc::Receiver, Arc};

use anyhow::Result;
use arc_swap::ArcSwapOption;
use log::{debug, warn};
use std_ext::ArcExt as _;
use thiserror::Error;

use helper_functions::accessors;
use types::{
    config::Config,
    containers::BeaconState,
    nonstandard::ExtendedBeaconState,
    primitives::{Slot, H256},
};

use crate::{
    attestation_pool::AttestationPool,
    events::EventChannels,
    messages::MutatorMessage,
    misc::{BeaconTupleDetails, ChainHead, ObservableBeaconState},
    pending_operations::PendingOperations,
    projector,
    traits::{HeadFunction, StateTransition, TupleStorage},
    tuple_cache::TupleCache,
};

/// Consistency violations of the surrounding system. Any of these aborts
/// the mutator; everything else is logged and retried on the next input.
#[derive(Debug, Error)]
pub enum Error {
    #[error("tuple not found for new head block (root: {root:?})")]
    HeadTupleMissing { root: H256 },
    #[error("tuple storage lookup failed (root: {root:?})")]
    Storage { root: H256, source: anyhow::Error },
}

pub struct Mutator<T, H, S> {
    config: Arc<Config>,
    transition: T,
    head_function: H,
    storage: S,
    pool: Arc<AttestationPool>,
    tuple_cache: Arc<TupleCache>,
    channels: Arc<EventChannels>,
    head: Option<BeaconTupleDetails>,
    latest_state: Arc<ArcSwapOption<ExtendedBeaconState>>,
    mutator_rx: Receiver<MutatorMessage>,
}

impl<T: StateTransition, H: HeadFunction, S: TupleStorage> Mutator<T, H, S> {
    #[expect(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        transition: T,
        head_function: H,
        storage: S,
        pool: Arc<AttestationPool>,
        tuple_cache: Arc<TupleCache>,
        channels: Arc<EventChannels>,
        latest_state: Arc<ArcSwapOption<ExtendedBeaconState>>,
        mutator_rx: Receiver<MutatorMessage>,
    ) -> Self {
        Self {
            config,
            transition,
            head_function,
            storage,
            pool,
            tuple_cache,
            channels,
            head: None,
            latest_state,
            mutator_rx,
        }
    }

    pub fn run(mut self) -> Result<()> {
        // Storage may already hold a chain when the processor starts.
        if let Err(error) = self.update_head() {
            if error.is::<Error>() {
                return Err(error);
            }

            debug!("initial head update failed: {error:?}");
        }

        loop {
            match self.mutator_rx.recv() {
                Ok(MutatorMessage::Tick { slot }) => {
                    if let Err(error) = self.handle_tick(slot) {
                        warn!("failed to process tick at slot {slot}: {error:?}");
                    }
                }
                Ok(MutatorMessage::BlockImported { details }) => {
                    if let Err(error) = self.handle_block_imported(&details) {
                        if error.is::<Error>() {
                            return Err(error);
                        }

                        warn!(
                            "failed to process imported block at slot {}: {error:?}",
                            details.block().slot,
                        );
                    }
                }
                Ok(MutatorMessage::Stop) | Err(_) => break,
            }
        }

        Ok(())
    }

    fn handle_tick(&mut self, slot: Slot) -> Result<()> {
        // Attestations are includable only while
        // `attestation.slot > state.slot - inclusion_delay - slots_per_epoch`.
        if let Some(threshold_slot) = slot.checked_sub(self.config.attestation_retention_slots()) {
            self.pool.purge(threshold_slot);
        }

        let Some(head) = self.head.clone() else {
            debug!("skipping tick at slot {slot}: no block imported yet");
            return Ok(());
        };

        if head.block().slot > slot {
            return Ok(());
        }

        self.publish(&head, slot)
    }

    fn handle_block_imported(&mut self, details: &BeaconTupleDetails) -> Result<()> {
        self.forget_included_attestations(details.final_state().state());
        self.update_head()
    }

    /// Drops cache entries for attestations the imported block already put
    /// on chain.
    fn forget_included_attestations(&self, state: &BeaconState) {
        for pending in state.pending_attestations() {
            let pubkeys = accessors::get_attestation_participants(
                &self.config,
                state,
                &pending.data,
                &pending.aggregation_bits,
            )
            .and_then(|participants| accessors::map_indices_to_pubkeys(state, &participants));

            match pubkeys {
                Ok(pubkeys) => {
                    for pubkey in pubkeys {
                        self.pool.forget(pubkey, pending.data.slot);
                    }
                }
                Err(error) => warn!(
                    "failed to expand on-chain attestation at slot {}: {error:?}",
                    pending.data.slot,
                ),
            }
        }
    }

    fn update_head(&mut self) -> Result<()> {
        let pending_operations = self.pool.snapshot();

        let new_head = self
            .head_function
            .head(&|validator| pending_operations.latest_attestation(validator.pubkey))?;

        if self
            .head
            .as_ref()
            .is_some_and(|head| head.block() == &new_head)
        {
            return Ok(());
        }

        let details = match self.tuple_cache.get(&new_head) {
            Some(details) => details,
            None => {
                let root = new_head.hash_tree_root();

                let tuple = self
                    .storage
                    .get(root)
                    .map_err(|source| Error::Storage { root, source })?
                    .ok_or(Error::HeadTupleMissing { root })?;

                BeaconTupleDetails::from_tuple(tuple)
            }
        };

        self.apply_new_head(details)
    }

    fn apply_new_head(&mut self, details: BeaconTupleDetails) -> Result<()> {
        self.head = Some(details.clone());
        self.channels.heads.send(ChainHead::new(details.tuple.clone()));

        let Some(latest_state) = self.latest_state.load_full() else {
            return Ok(());
        };

        if details.block().slot > latest_state.slot() {
            return Ok(());
        }

        self.publish(&details, latest_state.slot())
    }

    /// Emits the observable states for `head` at `slot`. Every emission of
    /// one call shares the pending-operations snapshot taken on entry.
    fn publish(&mut self, head: &BeaconTupleDetails, slot: Slot) -> Result<()> {
        let pending_operations = self.pool.snapshot();

        self.channels
            .pending_operations
            .send(pending_operations.clone());

        if slot > head.block().slot {
            let projected = Arc::new(projector::process_slots(
                &self.config,
                &self.transition,
                head.final_state(),
                slot,
            )?);

            self.emit_observable_state(head, projected.clone_arc(), pending_operations.clone());

            if let Some(post_epoch) = projector::process_epoch_if_needed(
                &self.config,
                &self.transition,
                head.final_state(),
                &projected,
            )? {
                self.emit_observable_state(head, Arc::new(post_epoch), pending_operations);
            }

            return Ok(());
        }

        // The importer may have precomputed the intermediate states of the
        // head's slot; republishing each captures the fine-grained
        // progression without re-running any transition.
        let precomputed = [
            &head.post_slot_state,
            &head.post_block_state,
            &head.post_epoch_state,
        ];

        let mut emitted = false;

        for state in precomputed.into_iter().flatten() {
            emitted = true;
            self.emit_observable_state(head, state.clone_arc(), pending_operations.clone());
        }

        if !emitted {
            self.emit_observable_state(head, head.final_state().clone_arc(), pending_operations);
        }

        Ok(())
    }

    fn emit_observable_state(
        &mut self,
        head: &BeaconTupleDetails,
        state: Arc<ExtendedBeaconState>,
        pending_operations: PendingOperations,
    ) {
        self.latest_state.store(Some(state.clone_arc()));
        self.channels.observable_states.send(ObservableBeaconState::new(
            head.block().clone_arc(),
            state,
            pending_operations,
        ));
    }
}
