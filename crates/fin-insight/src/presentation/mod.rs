//! Pure transforms from model answers into display structures.

pub mod catalog;
pub mod charts;
pub mod loan;
pub mod pages;
pub mod segment;

pub use catalog::{CatalogError, SegmentCatalog, SegmentProfile, TypicalValues};
pub use charts::{asset_distribution, profile_point, segment_color, segment_comparison};
pub use loan::{format_probability, LoanOutcomeView};
pub use pages::{coming_soon, home, login, navigation, FormPage, Navigation};
pub use segment::{SegmentCard, SegmentResultView};
