//! The observable state of the beacon chain.
//!
//! This crate continuously materializes, from slot ticks, gossiped
//! attestations and imported block tuples, the three reactive outputs a
//! local validator depends on:
//! - the current fork choice head,
//! - the head's post-state advanced by empty slots to the wall clock slot,
//! - the operations observed but not yet included on chain.
//!
//! It handles the following concerns:
//! - Buffering and participant expansion of attestations
//!   ([`AttestationPool`], the aggregation job).
//! - Projecting states across empty slots and epoch boundaries
//!   ([`process_slots`], [`process_epoch_if_needed`]).
//! - Tracking head changes against the fork choice rule (the mutator
//!   thread).
//! - Replay-last broadcast of every output ([`EventChannels`]).
//!
//! The state transitions, the fork choice rule and tuple storage are
//! collaborators consumed through [`StateTransition`], [`HeadFunction`]
//! and [`TupleStorage`].

pub use crate::{
    aggregator::AGGREGATION_INTERVAL,
    attestation_pool::AttestationPool,
    controller::{Controller, ControllerHandle, InputStreams},
    events::{
        EventChannels, ReplayChannel, ReplayReceiver, StreamError, DEFAULT_CHANNEL_CAPACITY,
    },
    misc::{BeaconTuple, BeaconTupleDetails, ChainHead, ObservableBeaconState},
    mutator::Error as ProcessingError,
    pending_operations::PendingOperations,
    projector::{process_epoch_if_needed, process_slots},
    traits::{HeadFunction, StateTransition, TupleStorage},
    tuple_cache::{TupleCache, DEFAULT_TUPLE_CACHE_SIZE},
};

mod aggregator;
mod attestation_pool;
mod controller;
mod events;
mod messages;
mod misc;
mod mutator;
mod pending_operations;
mod projector;
mod traits;
mod tuple_cache;
