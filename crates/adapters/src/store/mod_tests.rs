// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    plain           = { "/app", "web", "/app/web" },
    trailing_slash  = { "/app/", "web", "/app/web" },
    leading_slash   = { "/app", "/web", "/app/web" },
    root            = { "/", "web", "/web" },
)]
fn join_key_uses_one_separator(dir: &str, name: &str, expected: &str) {
    assert_eq!(join_key(dir, name), expected);
}

#[yare::parameterized(
    nested   = { "/app/web/image", "image" },
    trailing = { "/app/web/", "web" },
    bare     = { "web", "web" },
)]
fn last_segment_of_key(key: &str, expected: &str) {
    assert_eq!(last_segment(key), expected);
}
