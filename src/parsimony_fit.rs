//! Parallel epimutation pattern fit over all regions
//!

use std::collections::BTreeMap;
use std::sync::mpsc::channel;
use std::time::Instant;

use log::{debug, info};
use simple_error::{SimpleResult, map_err_with};

use crate::linkage::Linkage;
use crate::pattern_search::{Candidate, CandidateTable, PatternSearchSettings, search_patterns};
use crate::region_block::RegionBlock;
use crate::region_table::CountTable;
use crate::sample_tree::SampleTree;

pub struct ParsimonyFitSettings {
    pub search: PatternSearchSettings,

    /// Number of worker threads
    pub thread_count: usize,

    /// Maximum number of regions handled by one worker task
    pub chunk_size: usize,
}

impl Default for ParsimonyFitSettings {
    fn default() -> Self {
        Self {
            search: PatternSearchSettings::default(),
            thread_count: 1,
            chunk_size: 10,
        }
    }
}

/// Epimutation fit result for one region
#[derive(Clone, Debug, PartialEq)]
pub struct RegionFit {
    pub region_name: String,

    /// Most likely pattern over all mutation counts
    pub best: Candidate,

    /// Best pattern found at each mutation count
    pub candidates: CandidateTable,
}

/// Run the full pattern search over one chunk of regions
fn fit_region_chunk(
    tree: &SampleTree,
    chunk: &RegionBlock,
    settings: &PatternSearchSettings,
) -> Vec<RegionFit> {
    let tables = search_patterns(tree, &tree.get_full_sub_tree(), &chunk.full_view(), settings);
    chunk
        .region_names
        .iter()
        .zip(tables)
        .map(|(region_name, candidates)| {
            // Slot 0 always holds the empty pattern, so there is always a best candidate
            let best = candidates.best().unwrap().clone();
            RegionFit {
                region_name: region_name.clone(),
                best,
                candidates,
            }
        })
        .collect()
}

/// Fit all regions in the block, distributing chunks of regions over a worker pool
///
/// Results are returned in the input region order, regardless of thread count.
///
pub fn fit_region_block(
    tree: &SampleTree,
    regions: &RegionBlock,
    settings: &ParsimonyFitSettings,
) -> SimpleResult<Vec<RegionFit>> {
    let region_count = regions.region_count();
    if region_count == 0 {
        return Ok(Vec::new());
    }
    let chunk_size = std::cmp::min(region_count, settings.chunk_size);
    assert!(chunk_size > 0);

    let worker_pool = map_err_with!(
        rayon::ThreadPoolBuilder::new()
            .num_threads(settings.thread_count)
            .build(),
        "Unable to create worker thread pool"
    )?;

    info!(
        "Fitting epimutation patterns for {region_count} regions in {} chunks",
        region_count.div_ceil(chunk_size)
    );

    let search_settings = &settings.search;
    let (tx, rx) = channel();
    worker_pool.scope(move |scope| {
        for chunk_start in (0..region_count).step_by(chunk_size) {
            let tx = tx.clone();
            let chunk = regions.get_chunk(chunk_start, chunk_size);
            scope.spawn(move |_| {
                let chunk_start_time = Instant::now();
                let result = fit_region_chunk(tree, &chunk, search_settings);
                debug!(
                    "Finished region chunk starting at {chunk_start} in {:.3}s",
                    chunk_start_time.elapsed().as_secs_f64()
                );
                tx.send((chunk_start, result)).unwrap();
            });
        }
    });

    // Chunks complete in any order, so restore the input order by chunk offset
    let mut chunk_results = BTreeMap::new();
    for (chunk_start, result) in rx {
        chunk_results.insert(chunk_start, result);
    }
    let region_fits = chunk_results.into_values().flatten().collect::<Vec<_>>();
    assert_eq!(region_fits.len(), region_count);

    Ok(region_fits)
}

/// Find the most parsimonious epimutation pattern for every region
///
/// The sample tree is built once from the linkage and shared by all workers.
///
/// Returns the sample tree together with the fit of each region, in input region order
///
pub fn dmr_parsimony_fit(
    linkage: &Linkage,
    labels: Option<&[String]>,
    mc: &CountTable,
    cov: &CountTable,
    settings: &ParsimonyFitSettings,
) -> SimpleResult<(SampleTree, Vec<RegionFit>)> {
    let tree = SampleTree::from_linkage(linkage, labels)?;
    let regions = RegionBlock::new(&tree, mc, cov);
    let region_fits = fit_region_block(&tree, &regions, settings)?;
    Ok((tree, region_fits))
}
