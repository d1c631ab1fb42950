// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use dsim_track::test_helpers::create_tracker;

use crate::tree::Tree;

#[must_use]
pub fn start_test(full_filepath: &str) -> Tree {
    Tree::new(&create_tracker(full_filepath))
}
