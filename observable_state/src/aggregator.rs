use core::time::Duration;
use std::sync::{
    mpsc::{Receiver, RecvTimeoutError},
    Arc,
};

use anyhow::Result;
use arc_swap::ArcSwapOption;
use log::warn;
use std_ext::ArcExt as _;

use helper_functions::accessors;
use types::{config::Config, containers::Attestation, nonstandard::ExtendedBeaconState};

use crate::attestation_pool::AttestationPool;

/// Period of the participant-expansion job.
pub const AGGREGATION_INTERVAL: Duration = Duration::from_millis(500);

/// The fixed-rate job that expands buffered aggregate attestations into
/// per-validator cache entries.
pub struct Aggregator {
    config: Arc<Config>,
    pool: Arc<AttestationPool>,
    latest_state: Arc<ArcSwapOption<ExtendedBeaconState>>,
    stop_rx: Receiver<()>,
}

impl Aggregator {
    pub const fn new(
        config: Arc<Config>,
        pool: Arc<AttestationPool>,
        latest_state: Arc<ArcSwapOption<ExtendedBeaconState>>,
        stop_rx: Receiver<()>,
    ) -> Self {
        Self {
            config,
            pool,
            latest_state,
            stop_rx,
        }
    }

    pub fn run(self) {
        loop {
            self.expand_buffered_attestations();

            match self.stop_rx.recv_timeout(AGGREGATION_INTERVAL) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }

    fn expand_buffered_attestations(&self) {
        // Expanding an aggregate to its participants requires a state, so
        // the job idles until the first observable state is published.
        let Some(state) = self.latest_state.load_full() else {
            return;
        };

        for attestation in self.pool.drain_up_to(state.slot()) {
            if let Err(error) = self.ingest(&state, &attestation) {
                warn!(
                    "failed to expand attestation participants at slot {}: {error:?}",
                    attestation.data.slot,
                );
            }
        }
    }

    fn ingest(&self, state: &ExtendedBeaconState, attestation: &Arc<Attestation>) -> Result<()> {
        let participants = accessors::get_attestation_participants(
            &self.config,
            state.state(),
            &attestation.data,
            &attestation.aggregation_bits,
        )?;

        let pubkeys = accessors::map_indices_to_pubkeys(state.state(), &participants)?;

        for pubkey in pubkeys {
            self.pool.ingest_latest(pubkey, attestation.clone_arc());
        }

        Ok(())
    }
}
