mod collect;
mod index;
mod parse;
mod record;

pub use collect::load_dataset;
pub use index::RelationshipIndex;
pub use parse::{IngestOptions, RawObject, ingest, parse_bundle};
pub use record::{Dataset, EdgeKind, Record, RecordKind, RelationshipEdge};
