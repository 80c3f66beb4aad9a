// Copyright (c) 2026 Aoba Authors. All rights reserved.
// Use of this source is governed by Apache-2.0 License that can be found
// in the LICENSE file.

use aoba_codec::TopicFilter;

fn main() {
    let filter = TopicFilter::parse("sensors/+/temp").unwrap();
    println!("filter: {filter:?}");
    assert!(filter.is_match("sensors/kitchen/temp"));
    assert!(!filter.is_match("sensors/kitchen/humidity"));

    let tail = TopicFilter::parse("sensors/#").unwrap();
    assert!(tail.is_match("sensors"));
    assert!(tail.is_match("sensors/attic/temp"));
}
