//! Domain Proxy Active Mode Controller
//!
//! Decides, per CBSD, which SAS requests to send and which local
//! bookkeeping to apply so that spectrum usage tracks operator intent
//! within SAS bandwidth, EIRP and redundancy constraints.
//!
//! The core is synchronous and error-free: [`ActionGenerator`] turns a
//! snapshot of CBSD state into [`Action`]s, and [`run_tick`] executes
//! them against a store in one transaction.

pub mod action;
pub mod bandwidth;
pub mod controller;
pub mod eirp;
pub mod frequency;
pub mod generator;
pub mod grants;
pub mod idle;
pub mod processors;
pub mod rng;
pub mod sas;
pub mod selection;


pub use action::Action;
pub use bandwidth::{pick_bandwidth_selection_order, Redundancy, SelectionData};
pub use controller::{run_tick, TickReport};
pub use eirp::EirpCalculator;
pub use frequency::{calc_available_frequencies, unset_grant_frequency, HIGHEST_HZ, LOWEST_HZ, UNIT_HZ};
pub use generator::ActionGenerator;
pub use grants::{process_grants, GrantProcessor, Processors};
pub use idle::remove_idle_grants;
pub use rng::{FixedIndex, RandomIndex, ThreadRandom};
