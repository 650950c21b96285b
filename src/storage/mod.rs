mod snapshot;

pub use snapshot::{
    encode_csv, snapshot_path, sort_newest_first, write_snapshot, SnapshotError, HEADER,
};
