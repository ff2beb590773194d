#![no_main]

use libfuzzer_sys::fuzz_target;
use txfrecord::Record;

fuzz_target!(|data: &[u8]| {
    // Record bytes come from log files and must fail cleanly when corrupt.
    let mut record = Record::new();
    if record.decode(data).is_err() {
        assert!(record.is_empty());
    }
});
