use std::sync::mpsc::Sender;

use log::debug;

use types::primitives::Slot;

use crate::misc::BeaconTupleDetails;

pub enum MutatorMessage {
    Tick { slot: Slot },
    BlockImported { details: BeaconTupleDetails },
    Stop,
}

impl MutatorMessage {
    pub fn send(self, tx: &Sender<Self>) {
        // The mutator thread exits before the sender is dropped in normal
        // operation, so a failed send can only mean shutdown is underway.
        if tx.send(self).is_err() {
            debug!("send to mutator failed because the receiver was dropped");
        }
    }
}
