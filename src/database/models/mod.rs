pub mod matrix;
pub mod phase;
pub mod potential;
pub mod product_development;
pub mod profile;
pub mod user;

pub use matrix::MatrixCategory;
pub use phase::{Phase, PhaseSummary};
pub use potential::Potential;
pub use product_development::ProductDevelopmentSection;
pub use profile::{ProfileSection, ProfileSectionWithPhase};
pub use user::User;
