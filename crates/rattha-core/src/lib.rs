pub mod category;
pub mod config;
pub mod finalize;
pub mod heal;
pub mod ident;
pub mod legacy;
pub mod numerals;
pub mod reconcile;
pub mod record;
pub mod schema;
pub mod similarity;
pub mod sort_key;

pub use category::Category;
pub use config::{ConfigError, EditionPaths, PipelineConfig, RetrySettings};
pub use finalize::{FinalSection, finalize};
pub use heal::{HealReport, Healed, MissingIds, Repair, heal};
pub use ident::resolve_id;
pub use legacy::{LegacyEdition, LegacyMap};
pub use numerals::normalize_numerals;
pub use reconcile::{SUBSTITUTE_THRESHOLD, VERIFY_THRESHOLD, reconcile_batch, verify_status};
pub use record::{LegacyReference, RecordKind, SectionRecord, Status};
pub use schema::canonical;
pub use similarity::similarity;
pub use sort_key::{OrderKey, order_key};
