pub mod memory;
pub mod sequence;
pub mod store;
pub mod supabase;

pub use memory::InMemoryStore;
pub use sequence::{insert_with_next_order, SequenceError, SequenceScope};
pub use store::{
    from_document, to_document, Comparison, Condition, Filter, RecordStore, SortDirection,
    SortKey, StoreError, UniqueIndex,
};
pub use supabase::SupabaseClient;
