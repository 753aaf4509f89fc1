//! Read access to hospitals, clinics and the insurances they accept.

mod directory;
mod read;
mod types;

pub use directory::PgProviderDirectory;
pub use read::find_providers_by_insurance;
pub use types::ProviderInsuranceRow;
