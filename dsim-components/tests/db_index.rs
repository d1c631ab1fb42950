// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

use dsim_components::db_index::{BTreeIndex, HashIndex, HeapFile};
use dsim_components::test_helpers::{call, client_and, replies};
use dsim_engine::test_helpers::start_test;

const D: f64 = 10e6;

#[test]
fn inserts_and_deletes_change_the_record_count() {
    let tree = start_test(file!());
    let (mut sim, client, heap) = client_and(tree, "heap", HeapFile::new());

    for i in 0..3 {
        call(&mut sim, client, f64::from(i), "heap", "insert");
    }
    sim.run_until_idle(100).unwrap();
    assert_eq!(sim.processor::<HeapFile>(heap).unwrap().curr_record_count, 3);
    assert_eq!(sim.tree().property(heap, "curr_record_count"), Some(3.0));

    let now = sim.now();
    for i in 0..5 {
        call(&mut sim, client, now + f64::from(i), "heap", "deleteByOffset");
    }
    sim.run_until_idle(100).unwrap();
    assert_eq!(sim.processor::<HeapFile>(heap).unwrap().curr_record_count, 1);

    let replies = replies(&sim, client);
    assert_eq!(replies.len(), 8);
    assert!(replies.iter().all(|r| !r.is_error()));
    assert_eq!(replies[0].time, 2.0 * D);
}

#[test]
fn full_index_stops_growing() {
    let tree = start_test(file!());
    let (mut sim, client, index) = client_and(tree, "hash", HashIndex::new());
    sim.set_property(index, "disk_size", 1024.0 * 1024.0).unwrap();
    sim.set_property(index, "curr_record_count", 1024.0).unwrap();

    call(&mut sim, client, 0.0, "hash", "insert");
    sim.run_until_idle(100).unwrap();

    let hash = sim.processor::<HashIndex>(index).unwrap();
    assert!(hash.is_full());
    assert_eq!(hash.curr_record_count, 1024);
    assert_eq!(replies(&sim, client)[0].time, 4.0 * D);
}

#[test]
fn read_methods_and_invalid_method() {
    let tree = start_test(file!());
    let (mut sim, client, index) = client_and(tree, "btree", BTreeIndex::new());
    sim.set_property(index, "curr_record_count", 2000.0).unwrap();

    call(&mut sim, client, 0.0, "btree", "findEquals");
    call(&mut sim, client, 0.0, "btree", "rangeSearch");
    call(&mut sim, client, 0.0, "btree", "scan");
    call(&mut sim, client, 0.0, "btree", "update");
    sim.run_until_idle(100).unwrap();

    let replies = replies(&sim, client);
    assert_eq!(replies.len(), 4);
    assert_eq!(replies[0].error_reason(), Some("Invalid method: update"));
    assert_eq!(replies[0].time, 0.0);
    // 2000 records fill 3 pages
    let times: Vec<f64> = replies[1..].iter().map(|r| r.time).collect();
    assert_eq!(times, vec![3.0 * D, 5.0 * D, 5.0 * D]);
}
