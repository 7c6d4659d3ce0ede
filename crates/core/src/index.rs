//! Document indexing: build name-keyed lookup tables for resolution.

use std::collections::HashMap;

use crate::model::*;

/// A path chain's content as stored in the index; declaration order is not
/// retained.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainDef {
    pub paths: Vec<BezierRef>,
    pub heading: HeadingType,
}

/// Name-keyed lookup tables derived from one document. Immutable; any edit
/// requires re-extraction and re-indexing.
#[derive(Debug, Clone, Default)]
pub struct ResolvedIndex {
    pub values: HashMap<ValueName, ValueBinding>,
    pub poses: HashMap<PoseName, PoseRef>,
    pub beziers: HashMap<BezierName, BezierRef>,
    pub path_chains: HashMap<PathChainName, ChainDef>,
}

/// Total function from document to index. Identically-named declarations
/// within one category overwrite (last write wins); uniqueness is enforced
/// by validation, not here, so that duplication surfaces as a diagnostic
/// instead of being silently dropped.
pub fn build_index(file: &PathChainFile) -> ResolvedIndex {
    let mut index = ResolvedIndex::default();
    for nv in &file.values {
        index.values.insert(nv.name.clone(), nv.value.clone());
    }
    for np in &file.poses {
        index
            .poses
            .insert(np.name.clone(), PoseRef::Pose(np.pose.clone()));
    }
    for nb in &file.beziers {
        index
            .beziers
            .insert(nb.name.clone(), BezierRef::Bezier(nb.points.clone()));
    }
    for npc in &file.path_chains {
        index.path_chains.insert(
            npc.name.clone(),
            ChainDef {
                paths: npc.paths.clone(),
                heading: npc.heading.clone(),
            },
        );
    }
    index
}
