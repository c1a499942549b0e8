// Library exports for reportgrid

pub mod backend;
pub mod chart;
pub mod compose;
pub mod formatter;
pub mod ir;
pub mod palette;
pub mod record;
pub mod resolve;
pub mod scale;
pub mod span;
pub mod table;
pub mod template;
pub mod validate;

pub use compose::{compose, compose_source};
pub use record::{DocumentSource, Record, RecordSet};
pub use table::RankingPolicy;
pub use template::Template;
