// Copyright (c) 2023 Graphcore Ltd. All rights reserved.

//! Database index cost models.
//!
//! A [`DbIndex`] models the disk access cost of the operations on a table
//! stored in a given [`IndexStructure`], following the textbook cost model
//! for heap files, sorted files, B-trees and hash indexes. Records are
//! packed into pages and pages are only filled to `page_occupancy_rate` to
//! leave room for updates.
//!
//! Supported methods:
//!
//!  - `insert`: adds a record unless the disk is full.
//!  - `deleteByOffset`: removes a record, always keeping at least one.
//!  - `scan`, `findEquals`, `rangeSearch`: read only.
//!
//! The reply to `insert` and `deleteByOffset` is costed on the table as it
//! was before the change.

use std::rc::Rc;

use dsim_engine::message::Send;
use dsim_engine::processor::Processor;
use dsim_engine::time::SimTime;
use dsim_engine::types::SimResult;
use dsim_engine::world::Context;
use dsim_model_builder::Properties;
use dsim_track::trace;

use crate::invalid_method;

/// The shape of a table at one point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    /// Pages currently in use.
    pub pages: f64,
    pub records_per_page: f64,
    pub disk_access_time: SimTime,
    pub record_processing_time: SimTime,
}

impl Geometry {
    /// Cost of reading every page.
    #[must_use]
    pub fn full_scan(&self) -> SimTime {
        self.pages * self.disk_access_time
    }

    /// Cost of rewriting every page after an ordered insert or delete.
    #[must_use]
    pub fn rewrite(&self) -> SimTime {
        self.pages * (self.disk_access_time + self.records_per_page * self.record_processing_time)
    }
}

/// The number of bits needed to hold `value`, and at least 1.
#[must_use]
pub fn log2(value: f64) -> f64 {
    let bits = u64::BITS - (value.max(0.0) as u64).leading_zeros();
    f64::from(bits.max(1))
}

/// How a table is laid out on disk.
pub trait IndexStructure: Clone + Default + 'static {
    fn scan_latency(&self, geometry: &Geometry) -> SimTime {
        geometry.full_scan()
    }

    fn equality_search_latency(&self, geometry: &Geometry) -> SimTime;
    fn range_search_latency(&self, geometry: &Geometry, num_records: f64) -> SimTime;
    fn insert_latency(&self, geometry: &Geometry) -> SimTime;
    fn delete_latency(&self, geometry: &Geometry) -> SimTime;

    /// Called after a record has been added or removed.
    fn records_changed(&mut self, geometry: &Geometry) {
        let _ = geometry;
    }
}

/// Records in no particular order.
#[derive(Clone, Debug, Default)]
pub struct Heap;

impl IndexStructure for Heap {
    fn equality_search_latency(&self, geometry: &Geometry) -> SimTime {
        ((geometry.full_scan() as u64) >> 1) as SimTime
    }

    fn range_search_latency(&self, geometry: &Geometry, _num_records: f64) -> SimTime {
        geometry.full_scan()
    }

    fn insert_latency(&self, geometry: &Geometry) -> SimTime {
        2.0 * geometry.disk_access_time
    }

    fn delete_latency(&self, geometry: &Geometry) -> SimTime {
        2.0 * geometry.disk_access_time
    }
}

/// Records sorted on the search key.
#[derive(Clone, Debug, Default)]
pub struct Sorted;

impl IndexStructure for Sorted {
    fn equality_search_latency(&self, geometry: &Geometry) -> SimTime {
        geometry.disk_access_time * log2(geometry.pages)
    }

    fn range_search_latency(&self, geometry: &Geometry, num_records: f64) -> SimTime {
        geometry.disk_access_time * (num_records + log2(geometry.pages))
    }

    fn insert_latency(&self, geometry: &Geometry) -> SimTime {
        self.equality_search_latency(geometry) + geometry.rewrite()
    }

    fn delete_latency(&self, geometry: &Geometry) -> SimTime {
        self.insert_latency(geometry)
    }
}

/// A B-tree with a fanout of 100.
#[derive(Clone, Debug)]
pub struct BTree {
    /// Height of the tree in levels of fanout.
    fanout: f64,
}

impl Default for BTree {
    fn default() -> Self {
        Self { fanout: 4.0 }
    }
}

impl BTree {
    #[must_use]
    pub fn fanout(&self) -> f64 {
        self.fanout
    }
}

impl IndexStructure for BTree {
    fn equality_search_latency(&self, geometry: &Geometry) -> SimTime {
        geometry.disk_access_time * (1.0 + self.fanout)
    }

    fn range_search_latency(&self, geometry: &Geometry, num_records: f64) -> SimTime {
        geometry.disk_access_time * (num_records + self.fanout)
    }

    fn insert_latency(&self, geometry: &Geometry) -> SimTime {
        self.equality_search_latency(geometry) + geometry.rewrite()
    }

    fn delete_latency(&self, geometry: &Geometry) -> SimTime {
        self.equality_search_latency(geometry) + 2.0 * geometry.disk_access_time
    }

    fn records_changed(&mut self, geometry: &Geometry) {
        self.fanout = geometry.pages.log2() / 100f64.log2();
    }
}

/// A static hash index.
#[derive(Clone, Debug, Default)]
pub struct Hashed;

impl IndexStructure for Hashed {
    fn equality_search_latency(&self, geometry: &Geometry) -> SimTime {
        2.0 * geometry.disk_access_time
    }

    fn range_search_latency(&self, geometry: &Geometry, _num_records: f64) -> SimTime {
        geometry.full_scan()
    }

    fn insert_latency(&self, geometry: &Geometry) -> SimTime {
        4.0 * geometry.disk_access_time
    }

    fn delete_latency(&self, geometry: &Geometry) -> SimTime {
        self.equality_search_latency(geometry) + 2.0 * geometry.disk_access_time
    }
}

#[derive(Clone, Properties)]
pub struct DbIndex<S: IndexStructure> {
    /// Time to read one page from disk.
    #[property(default = 10e6, min = 0, units = "ns")]
    pub disk_access_time: SimTime,

    #[property(default = 10737418240, min = 0, units = "bytes")]
    pub disk_size: f64,

    #[property(default = 1048576, min = 1, units = "bytes")]
    pub page_size: f64,

    #[property(default = 1024, min = 1, units = "bytes")]
    pub record_size: f64,

    /// Time to process one record once its page is in memory.
    #[property(default = 10, min = 0, units = "ns")]
    pub record_processing_time: SimTime,

    #[property(default = 0, min = 0, units = "records")]
    pub curr_record_count: u64,

    /// Fraction of each page filled with records.
    #[property(default = 0.67, min = 0.01, max = 1)]
    pub page_occupancy_rate: f64,

    structure: S,
}

pub type HeapFile = DbIndex<Heap>;
pub type SortedFile = DbIndex<Sorted>;
pub type BTreeIndex = DbIndex<BTree>;
pub type HashIndex = DbIndex<Hashed>;

impl<S: IndexStructure> DbIndex<S> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn structure(&self) -> &S {
        &self.structure
    }

    #[must_use]
    pub fn records_per_page(&self) -> f64 {
        (self.page_size / self.record_size).ceil()
    }

    #[must_use]
    pub fn max_num_pages(&self) -> f64 {
        (self.disk_size / self.page_size).floor()
    }

    #[must_use]
    pub fn max_records(&self) -> f64 {
        self.max_num_pages() * self.records_per_page()
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.curr_record_count as f64 >= self.max_records()
    }

    #[must_use]
    pub fn curr_num_pages(&self) -> f64 {
        (self.curr_record_count as f64 / (self.records_per_page() * self.page_occupancy_rate))
            .ceil()
    }

    #[must_use]
    pub fn geometry(&self) -> Geometry {
        Geometry {
            pages: self.curr_num_pages(),
            records_per_page: self.records_per_page(),
            disk_access_time: self.disk_access_time,
            record_processing_time: self.record_processing_time,
        }
    }

    #[must_use]
    pub fn scan_latency(&self) -> SimTime {
        self.structure.scan_latency(&self.geometry())
    }

    #[must_use]
    pub fn equality_search_latency(&self) -> SimTime {
        self.structure.equality_search_latency(&self.geometry())
    }

    #[must_use]
    pub fn range_search_latency(&self, num_records: f64) -> SimTime {
        self.structure
            .range_search_latency(&self.geometry(), num_records)
    }

    #[must_use]
    pub fn insert_latency(&self) -> SimTime {
        self.structure.insert_latency(&self.geometry())
    }

    #[must_use]
    pub fn delete_latency(&self) -> SimTime {
        self.structure.delete_latency(&self.geometry())
    }

    fn records_changed(&mut self) {
        let geometry = self.geometry();
        self.structure.records_changed(&geometry);
    }
}

impl<S: IndexStructure> Processor for DbIndex<S> {
    fn process_send(&mut self, send: Rc<Send>, ctx: &mut Context) -> SimResult {
        let method = send.address.method.as_str();
        match method {
            "insert" => {
                ctx.reply_to_send(&send, self.insert_latency(), None)?;
                if !self.is_full() {
                    self.curr_record_count += 1;
                    self.records_changed();
                }
            }
            "deleteByOffset" => {
                ctx.reply_to_send(&send, self.delete_latency(), None)?;
                if self.curr_record_count > 1 {
                    self.curr_record_count -= 1;
                    self.records_changed();
                }
            }
            "scan" => {
                ctx.reply_to_send(&send, self.scan_latency(), None)?;
            }
            "findEquals" => {
                ctx.reply_to_send(&send, self.equality_search_latency(), None)?;
            }
            "rangeSearch" => {
                ctx.reply_to_send(&send, self.range_search_latency(1.0), None)?;
            }
            _ => {
                ctx.reply_to_send(&send, 0.0, Some(&invalid_method(method)))?;
                return Ok(());
            }
        }
        trace!(ctx.entity() ; "{method}: {} records", self.curr_record_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    const D: f64 = 10e6;

    fn with_records<S: IndexStructure>(count: u64) -> DbIndex<S> {
        let mut index = DbIndex::<S>::new();
        index.curr_record_count = count;
        index
    }

    #[test]
    fn log2_is_bit_length() {
        assert_eq!(log2(0.0), 1.0);
        assert_eq!(log2(1.0), 1.0);
        assert_eq!(log2(2.0), 2.0);
        assert_eq!(log2(3.0), 2.0);
        assert_eq!(log2(8.0), 4.0);
        assert_eq!(log2(1000.0), 10.0);
    }

    #[test]
    fn geometry_defaults() {
        let index = HeapFile::new();
        assert_eq!(index.records_per_page(), 1024.0);
        assert_eq!(index.max_num_pages(), 10240.0);
        assert_eq!(index.max_records(), 10240.0 * 1024.0);
        assert_eq!(index.curr_num_pages(), 0.0);
        assert!(!index.is_full());

        // 1024 * 0.67 = 686.08 records fit in a page
        let index = with_records::<Heap>(687);
        assert_eq!(index.curr_num_pages(), 2.0);
    }

    #[test]
    fn heap_costs() {
        let index = with_records::<Heap>(2000);
        let pages = index.curr_num_pages();
        assert_eq!(pages, 3.0);
        assert_eq!(index.scan_latency(), pages * D);
        assert_eq!(index.equality_search_latency(), 15e6);
        assert_eq!(index.range_search_latency(1.0), pages * D);
        assert_eq!(index.insert_latency(), 2.0 * D);
        assert_eq!(index.delete_latency(), 2.0 * D);
    }

    #[test]
    fn sorted_costs() {
        let index = with_records::<Sorted>(2000);
        let eq = D * 2.0;
        assert_eq!(index.equality_search_latency(), eq);
        assert_eq!(index.range_search_latency(1.0), D * 3.0);
        let rewrite = 3.0 * (D + 1024.0 * 10.0);
        assert_eq!(index.insert_latency(), eq + rewrite);
        assert_eq!(index.delete_latency(), eq + rewrite);
    }

    #[test]
    fn btree_costs() {
        let index = with_records::<BTree>(2000);
        assert_eq!(index.structure().fanout(), 4.0);
        assert_eq!(index.equality_search_latency(), 5.0 * D);
        assert_eq!(index.range_search_latency(1.0), 5.0 * D);
        assert_eq!(index.delete_latency(), 7.0 * D);

        let mut index = index;
        index.records_changed();
        assert_relative_eq!(index.structure().fanout(), 3f64.log2() / 100f64.log2());
    }

    #[test]
    fn hash_costs() {
        let index = with_records::<Hashed>(2000);
        assert_eq!(index.scan_latency(), 3.0 * D);
        assert_eq!(index.equality_search_latency(), 2.0 * D);
        assert_eq!(index.range_search_latency(1.0), 3.0 * D);
        assert_eq!(index.insert_latency(), 4.0 * D);
        assert_eq!(index.delete_latency(), 4.0 * D);
    }
}
