//! Building-registry and land-registry lookups, keyed by heuristically
//! derived administrative codes.

pub mod building;
pub mod codes;
pub mod land;

pub use building::BuildingLedgerClient;
pub use land::{LandForestClient, LandLedgerClient, LandRegulationClient, LandService};
