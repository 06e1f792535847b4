//! Core data models for the public-data analysis pipeline.

pub mod analysis;
pub mod codes;
pub mod coordinate;
pub mod registry;

pub use analysis::{AnalysisResult, AnalysisSummary};
pub use codes::AdminCodes;
pub use coordinate::{GeoPoint, ResolveMethod, ResolvedCoordinate};
pub use registry::{
    BuildingAreas, BuildingOverview, BuildingRecord, BuildingTitle, BuildingUnit, LandAddressMatch,
    LandAnalysis, LandBasic, LandCharacteristics, LandForestRecord, LandLedgerRecord, LandOwner,
    LandSearchMethod,
};
