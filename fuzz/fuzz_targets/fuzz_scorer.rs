#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pathrank::api::{MatchOptions, try_match};
use pathrank::highlight::{HighlightMode, highlight_regex};

#[derive(Debug, Arbitrary)]
struct Input<'a> {
    query: &'a str,
    items: Vec<&'a str>,
    unicode: bool,
    ispath: bool,
    limit: u8,
}

fuzz_target!(|input: Input<'_>| {
    let options = MatchOptions {
        unicode: input.unicode,
        ispath: input.ispath,
        limit: input.limit as usize,
        parallel_threshold: 0,
        ..Default::default()
    };
    let Ok(ranked) = try_match(&input.items, input.query, &options) else {
        return;
    };

    for result in &ranked {
        let item = input.items[result.index];
        // Positions must be in bounds and strictly increasing
        assert!(result.positions.iter().all(|&p| p < item.len()));
        assert!(result.positions.windows(2).all(|w| w[0] < w[1]));
        let _ = highlight_regex(HighlightMode::Full, item, &result.positions, "");
    }
});
