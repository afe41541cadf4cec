//! Fuzz target for loading arbitrary bytes as a delimited file.
//!
//! A load either succeeds with a consistent schema or returns an error.

#![no_main]

use dataeater::DataStore;
use libfuzzer_sys::fuzz_target;
use std::io::Write;

fuzz_target!(|data: &[u8]| {
    if data.len() > 50_000 {
        return;
    }

    if let Ok(mut temp_file) = tempfile::NamedTempFile::with_suffix(".csv") {
        if temp_file.write_all(data).is_ok() {
            let mut store = DataStore::new();
            if store.load_file(temp_file.path()).is_ok() {
                assert!(!store.columns().is_empty());
                let _ = store.fetch_all();
            }
        }
    }
});
