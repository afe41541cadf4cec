//! Fuzz target for prefix sniffing and the structural scan.
//!
//! Sniffing must never panic, whatever the bytes and wherever the prefix
//! is cut.

#![no_main]

use dataeater::sniff::Sniffer;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 100_000 {
        return;
    }

    let sniffer = Sniffer::new();
    for complete in [true, false] {
        let result = sniffer.sniff_bytes(data, complete);
        let _ = sniffer.jagged_rows_in(data, complete, Some(result.delimiter), result.encoding);
        let _ = sniffer.jagged_rows_in(data, complete, None, result.encoding);
    }
});
