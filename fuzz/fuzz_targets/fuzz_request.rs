#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must produce a response, never a panic
    let response = pathrank::api::handle_request(data);
    assert!(response.is_error() || response.matches.len() == response.regexes.len());
});
