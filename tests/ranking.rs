//! Ranking properties of the public matching API.

use pathrank::api::{MatchOptions, ctrlp_match, try_match};
use pathrank::highlight::HighlightMode;
use pathrank::query::MatchMode;

/// Path options that exercise the parallel path even for small lists
fn options() -> MatchOptions {
    MatchOptions {
        ispath: true,
        parallel_threshold: 0,
        ..Default::default()
    }
}

fn generated_paths(n: usize) -> Vec<String> {
    let dirs = ["src", "src/query", "src/utils", "tests", "benches", "docs/guide"];
    let stems = ["matcher", "scorer", "util", "str_util", "mod", "README", "fooBar", "main"];
    let exts = ["rs", "cc", "md", "h"];
    (0..n)
        .map(|i| {
            format!(
                "{}/{}_{}.{}",
                dirs[i % dirs.len()],
                stems[(i / 3) % stems.len()],
                i,
                exts[(i / 7) % exts.len()]
            )
        })
        .collect()
}

#[test]
fn matcher_ranks_above_str_util() {
    let items = ["src/matcher.cc", "src/str_util.cc", "README.md"];
    let response = ctrlp_match(&items, "smc", &options());

    assert_eq!(response.matches[0], "src/matcher.cc");
    assert!(!response.matches.iter().any(|m| m == "README.md"));
    if let Some(pos) = response.matches.iter().position(|m| m == "src/str_util.cc") {
        assert!(pos > 0);
    }
}

#[test]
fn inverted_query_excludes_substring() {
    let items = ["src/util.cc", "src/str_util.cc", "include/util.h"];
    let opts = MatchOptions {
        query_inverting_delimiter: "!".to_string(),
        ..options()
    };
    let response = ctrlp_match(&items, "util!str", &opts);

    assert!(response.matches.iter().any(|m| m == "src/util.cc"));
    assert!(response.matches.iter().any(|m| m == "include/util.h"));
    assert!(!response.matches.iter().any(|m| m.contains("str")));
}

#[test]
fn every_result_contains_query_as_subsequence() {
    let items = generated_paths(2000);
    let query = "sqmr";
    let ranked = try_match(&items, query, &options()).unwrap();
    assert!(!ranked.is_empty());

    for result in &ranked {
        let item = items[result.index].as_bytes();
        assert_eq!(result.positions.len(), query.len());
        assert!(result.positions.windows(2).all(|w| w[0] < w[1]));
        for (&pos, q) in result.positions.iter().zip(query.bytes()) {
            assert_eq!(item[pos].to_ascii_lowercase(), q);
        }
    }
}

#[test]
fn results_are_deterministic_across_thread_counts() {
    let items = generated_paths(20_000);
    let run = |max_threads: usize| {
        let opts = MatchOptions {
            limit: 50,
            max_threads,
            ..options()
        };
        try_match(&items, "utmr", &opts).unwrap()
    };

    let baseline = run(1);
    assert_eq!(baseline.len(), 50);
    assert_eq!(run(1), baseline);
    for threads in [2, 4, 0] {
        assert_eq!(run(threads), baseline);
    }
}

#[test]
fn smaller_limit_is_prefix_of_larger() {
    let items = generated_paths(5000);
    let with_limit = |limit: usize| {
        let opts = MatchOptions { limit, ..options() };
        ctrlp_match(&items, "mod", &opts)
    };

    let all = with_limit(0);
    let top = with_limit(10);
    assert_eq!(top.matches.len(), 10);
    assert_eq!(top.matches.as_slice(), &all.matches[..10]);
    assert_eq!(top.regexes.as_slice(), &all.regexes[..10]);
}

#[test]
fn current_file_is_excluded_unless_allowed() {
    let items = ["src/foo.rs", "lib/foo.rs", "foo.rs"];
    let opts = MatchOptions {
        crfile: "src/foo.rs".to_string(),
        match_crfile: false,
        ..options()
    };
    let response = ctrlp_match(&items, "foo", &opts);
    assert!(!response.matches.iter().any(|m| m == "src/foo.rs"));
    assert_eq!(response.matches.len(), 2);

    let opts = MatchOptions {
        match_crfile: true,
        ..opts
    };
    let response = ctrlp_match(&items, "foo", &opts);
    assert_eq!(response.matches.len(), 3);
    assert_eq!(response.matches.last().map(String::as_str), Some("src/foo.rs"));
}

#[test]
fn empty_items_give_empty_response() {
    let items: Vec<String> = Vec::new();
    let response = ctrlp_match(&items, "anything", &options());
    assert!(response.matches.is_empty());
    assert!(response.regexes.is_empty());
}

#[test]
fn empty_query_keeps_input_order() {
    let items = generated_paths(100);
    let opts = MatchOptions {
        limit: 15,
        ..options()
    };
    let response = ctrlp_match(&items, "", &opts);
    assert_eq!(response.matches.as_slice(), &items[..15]);
    assert!(response.regexes.iter().all(String::is_empty));
}

#[test]
fn match_order_follows_path_structure() {
    let items = [
        "barfoo",
        "fbar",
        "foo/bar",
        "foo/fbar",
        "foo/foobar",
        "foo/foo_bar",
        "foo/foo_bar_test",
        "foo/foo_test_bar",
        "foo/FooBar",
        "foo/abar",
        "foo/qux",
        "foob/ar",
    ];
    let response = ctrlp_match(&items, "fb", &options());

    assert!(!response.matches.iter().any(|m| m == "barfoo" || m == "foo/qux"));
    assert_eq!(response.matches.len(), 10);

    let rank = |item: &str| {
        response
            .matches
            .iter()
            .position(|m| m == item)
            .unwrap_or_else(|| panic!("{item} did not match"))
    };
    // Whole query as a prefix, then the same one level down
    assert_eq!(rank("fbar"), 0);
    assert_eq!(rank("foo/fbar"), 1);
    // Word starts, camelCase humps included
    assert!(rank("foo/fbar") < rank("foo/foo_bar"));
    assert!(rank("foo/fbar") < rank("foo/FooBar"));
    // More trailing unmatched text
    assert!(rank("foo/foo_bar") < rank("foo/foo_bar_test"));
    assert!(rank("foo/FooBar") < rank("foo/foo_bar_test"));
    // Matches in adjacent words beat matches with a word between them
    assert!(rank("foo/foo_bar_test") < rank("foo/foo_test_bar"));
    // Split across path components
    assert!(rank("foo/foo_test_bar") < rank("foo/bar"));
    // 'b' inside a word, or not at the start of the filename
    assert!(rank("foo/bar") < rank("foo/foobar"));
    assert!(rank("foo/bar") < rank("foo/abar"));
    assert!(rank("foo/bar") < rank("foob/ar"));
}

#[test]
fn exclusion_applies_beyond_the_match_key() {
    let items = ["foo.rs\tstr", "foo.cc\tok"];
    for mmode in [MatchMode::FirstNonTab, MatchMode::UntilLastTab] {
        let opts = MatchOptions {
            mmode,
            query_inverting_delimiter: "!".to_string(),
            ..options()
        };
        let response = ctrlp_match(&items, "foo!str", &opts);
        assert_eq!(response.matches, vec!["foo.cc\tok"], "{mmode}");
    }
}

#[test]
fn current_file_promotes_files_sharing_its_name() {
    let items = ["include/bar.h", "include/foo.h", "test/foo_test.cc", "test/bar_test.cc"];
    let opts = MatchOptions {
        crfile: "src/foo.cc".to_string(),
        ..options()
    };
    let response = ctrlp_match(&items, "", &opts);
    // Empty queries keep input order
    assert_eq!(response.matches, items);

    let response = ctrlp_match(&items, "h", &opts);
    assert_eq!(response.matches, vec!["include/foo.h", "include/bar.h"]);

    let response = ctrlp_match(&items, "test", &opts);
    assert_eq!(response.matches, vec!["test/foo_test.cc", "test/bar_test.cc"]);
}

#[test]
fn degenerate_paths() {
    let items = ["", "/", "a/", "/a"];
    let response = ctrlp_match(&items, "a", &options());
    assert_eq!(response.matches, vec!["a/", "/a"]);
}

#[test]
fn filename_only_ignores_directories() {
    let items = ["query/scorer.rs", "src/query.rs"];
    let opts = MatchOptions {
        mmode: MatchMode::FilenameOnly,
        ..options()
    };
    let response = ctrlp_match(&items, "query", &opts);
    assert_eq!(response.matches, vec!["src/query.rs"]);
}

#[test]
fn highlight_patterns_follow_mode() {
    let items = ["src/lib.rs"];
    let basic = MatchOptions {
        highlight_mode: HighlightMode::Basic,
        ..options()
    };
    let response = ctrlp_match(&items, "lib", &basic);
    assert_eq!(response.regexes, vec![r"\V\C\^src/\zslib\ze.rs\$"]);

    let none = MatchOptions {
        highlight_mode: HighlightMode::None,
        ..options()
    };
    assert_eq!(ctrlp_match(&items, "lib", &none).regexes, vec![""]);
}

#[test]
fn unsupported_mode_is_reported_in_band() {
    let opts = MatchOptions {
        mmode: MatchMode::Regex,
        ..options()
    };
    let response = ctrlp_match(&["a"], "a", &opts);
    assert_eq!(response.matches.len(), 1);
    assert!(response.matches[0].starts_with("ERROR: "));
    assert!(response.regexes.is_empty());
}
