#![no_main]

use libfuzzer_sys::fuzz_target;
use pathrank::query::{QueryOptions, parse_query};

fuzz_target!(|data: (&str, &str, bool)| {
    // Any query and delimiter must parse without panicking
    let (raw, delimiter, unicode) = data;
    let options = QueryOptions {
        ispath: true,
        unicode,
        inverting_delimiter: delimiter.to_string(),
        ..Default::default()
    };
    let _ = parse_query(raw, &options);
});
