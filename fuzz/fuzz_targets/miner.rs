#![no_main]

use libfuzzer_sys::fuzz_target;

use listing_scout::miner::{HiddenFieldMiner, RegexCategoryMiner};
use listing_scout::normalizer::normalize_listing_url;

fuzz_target!(|data: &[u8]| {
    let input = String::from_utf8_lossy(data);

    // Neither stage may panic, whatever the page or link looks like
    let _ = normalize_listing_url(&input);

    let (category, markup) = input.split_at(input.find('\n').unwrap_or(0));
    let _ = RegexCategoryMiner::new().mine(markup, category);
});
