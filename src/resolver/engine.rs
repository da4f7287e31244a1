// src/resolver/engine.rs

//! The backtracking dependency resolver
//!
//! The search keeps a partial assignment (name → chosen candidate) and a map
//! of open names with their accumulated constraints. Each step picks the most
//! constrained open name, enumerates its candidates in preference order, and
//! commits one tentatively; dependency edges either merge constraints into
//! open names, open new ones, or check against already assigned candidates.
//! A dead end undoes the most recent commit and tries the next candidate.
//!
//! The walk is an explicit stack of frames rather than recursion, so graph
//! depth is bounded by memory, not the call stack. Given identical inputs
//! and provider responses the search examines candidates in an identical
//! order; all intermediate maps are ordered.

use crate::error::{Error, Result};
use crate::metadata::{Candidate, MetadataProvider, PackageRef, Requirement, Source};
use crate::version::{Constraint, RVersion};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use tracing::{debug, warn};

use super::conflict::{format_chain, BlameLink, DeadEnd};
use super::solution::{DowngradeEntry, Solution, SourceSummary};

/// Options controlling one resolve run
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// R version currently installed; floors above it are deferred and the
    /// final verdict reports what forced a raise
    pub current_r: Option<RVersion>,
    /// Hard R ceiling: candidates whose floor exceeds it are rejected
    pub lock_r: Option<RVersion>,
    /// Bioconductor release to prefer when a requirement names none
    pub prefer_bioc_release: Option<String>,
    /// Activate Suggests edges
    pub include_optional: bool,
}

/// Dependency resolver over a metadata provider
pub struct Resolver<'a> {
    provider: &'a dyn MetadataProvider,
    options: ResolveOptions,
    cancel: Option<Arc<AtomicBool>>,
}

/// An unresolved name with its accumulated constraint and provenance
#[derive(Debug, Clone)]
struct OpenEntry {
    package: PackageRef,
    constraint: Constraint,
    blame: Vec<BlameLink>,
    is_root: bool,
}

/// One level of the search stack: a picked name and its candidate cursor
struct Frame {
    name: String,
    entry: OpenEntry,
    candidates: Vec<Candidate>,
    /// Most preferred candidate rejected by the R lock: (version, floor)
    lock_skipped: Option<(RVersion, RVersion)>,
    next: usize,
    /// Undo log: (name, constraint and blame before this commit merged into it)
    merged: Vec<(String, Constraint, Vec<BlameLink>)>,
    /// Undo log: names this commit opened
    opened: Vec<String>,
}

/// Filtered candidate list for one open name
struct Filtered {
    candidates: Vec<Candidate>,
    lock_skipped: Option<(RVersion, RVersion)>,
}

enum StepOutcome {
    Committed,
    Exhausted,
}

impl<'a> Resolver<'a> {
    pub fn new(provider: &'a dyn MetadataProvider, options: ResolveOptions) -> Self {
        Self {
            provider,
            options,
            cancel: None,
        }
    }

    /// Install a cooperative cancellation flag, checked at every
    /// candidate-commit boundary.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Run the search over the given root requirements
    pub fn resolve(&self, requirements: &[Requirement]) -> Result<Solution> {
        let mut search = Search {
            provider: self.provider,
            options: &self.options,
            cancel: self.cancel.as_deref(),
            open: BTreeMap::new(),
            assigned: BTreeMap::new(),
            stack: Vec::new(),
            best_dead_end: None,
        };
        search.seed(requirements)?;
        search.run()
    }
}

struct Search<'a> {
    provider: &'a dyn MetadataProvider,
    options: &'a ResolveOptions,
    cancel: Option<&'a AtomicBool>,
    open: BTreeMap<String, OpenEntry>,
    assigned: BTreeMap<String, Candidate>,
    stack: Vec<Frame>,
    best_dead_end: Option<DeadEnd>,
}

impl<'a> Search<'a> {
    fn check_cancelled(&self) -> Result<()> {
        if let Some(flag) = self.cancel {
            if flag.load(AtomicOrdering::Relaxed) {
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }

    /// Seed the open-name map from the root requirements
    ///
    /// GitHub targets are keyed under the package name their DESCRIPTION
    /// declares, not the `owner/repo` slug the manifest used. Two roots
    /// naming the same package from different sources fail immediately.
    fn seed(&mut self, requirements: &[Requirement]) -> Result<()> {
        for requirement in requirements {
            let (key, package) = match requirement.package.source {
                Source::Github => {
                    let candidates = match self.provider.candidates(&requirement.package) {
                        Ok(candidates) => candidates,
                        Err(e @ Error::MetadataUnavailable(_)) if requirement.optional => {
                            warn!("skipping optional target {}: {}", requirement.package, e);
                            continue;
                        }
                        Err(e) => return Err(e),
                    };
                    match candidates.first() {
                        Some(first) => (first.package.name.clone(), first.package.clone()),
                        None if requirement.optional => {
                            warn!("skipping optional target {}: no candidates", requirement.package);
                            continue;
                        }
                        None => {
                            return Err(Error::UnknownPackage {
                                name: requirement.package.name.clone(),
                                source_name: requirement.package.source.to_string(),
                            })
                        }
                    }
                }
                _ => (
                    requirement.package.name.clone(),
                    requirement.package.clone(),
                ),
            };

            if let Some(existing) = self.open.get_mut(&key) {
                if existing.package.source != package.source {
                    return Err(Error::SourceConflict {
                        name: key,
                        first: existing.package.source.to_string(),
                        second: package.source.to_string(),
                    });
                }
                existing.constraint = existing.constraint.merge(&requirement.constraint);
                continue;
            }

            // An explicitly requested ref with no candidates at all can never
            // resolve, so fail (or drop an optional target) up front.
            if requirement.package.source != Source::Github {
                let raw = match self.provider.candidates(&package) {
                    Ok(raw) => raw,
                    Err(e @ Error::MetadataUnavailable(_)) if requirement.optional => {
                        warn!("skipping optional target {}: {}", package, e);
                        continue;
                    }
                    Err(e) => return Err(e),
                };
                if raw.is_empty() {
                    if requirement.optional {
                        warn!("skipping optional target {}: no candidates", package);
                        continue;
                    }
                    return Err(Error::UnknownPackage {
                        name: package.name.clone(),
                        source_name: package.source.to_string(),
                    });
                }
            }

            self.open.insert(
                key,
                OpenEntry {
                    package,
                    constraint: requirement.constraint.clone(),
                    blame: Vec::new(),
                    is_root: true,
                },
            );
        }
        Ok(())
    }

    fn run(&mut self) -> Result<Solution> {
        loop {
            self.check_cancelled()?;

            if self.open.is_empty() {
                return self.build_solution();
            }

            let name = self.select_next()?;
            let entry = self.open.remove(&name).expect("selected name is open");
            let filtered = self.filtered(&entry)?;

            if filtered.candidates.is_empty() {
                debug!("no viable candidate for {}", name);
                self.record_dead_end(&name, &entry, &filtered);
                self.open.insert(name, entry);
                if !self.pop_and_retry()? {
                    return Err(self.surface_conflict());
                }
                continue;
            }

            self.stack.push(Frame {
                name,
                entry,
                candidates: filtered.candidates,
                lock_skipped: filtered.lock_skipped,
                next: 0,
                merged: Vec::new(),
                opened: Vec::new(),
            });

            match self.commit_top()? {
                StepOutcome::Committed => {}
                StepOutcome::Exhausted => {
                    if !self.pop_and_retry()? {
                        return Err(self.surface_conflict());
                    }
                }
            }
        }
    }

    /// Pick the next open name: roots first, then fewest remaining
    /// candidates, then lexicographic (the BTreeMap iteration order).
    fn select_next(&self) -> Result<String> {
        let mut best: Option<(bool, usize, &str)> = None;
        for (name, entry) in &self.open {
            let count = self.filtered(entry)?.candidates.len();
            let key = (!entry.is_root, count, name.as_str());
            if best.map_or(true, |current| key < current) {
                best = Some(key);
            }
        }
        Ok(best.expect("open set is non-empty").2.to_string())
    }

    /// Enumerate and filter candidates for an open name
    ///
    /// Order: provider preference (newest first), except that with
    /// `current_r` set, candidates that fit under the effective R ceiling
    /// (current_r raised by already committed floors) are tried before
    /// candidates that would raise it further.
    fn filtered(&self, entry: &OpenEntry) -> Result<Filtered> {
        let raw = self.provider.candidates(&entry.package)?;

        let ceiling = self.options.current_r.as_ref().map(|current| {
            let mut ceiling = current.clone();
            for candidate in self.assigned.values() {
                if let Some(floor) = &candidate.r_floor {
                    if *floor > ceiling {
                        ceiling = floor.clone();
                    }
                }
            }
            ceiling
        });

        let mut fits = Vec::new();
        let mut raises = Vec::new();
        let mut lock_skipped = None;

        for candidate in raw {
            if !entry.constraint.satisfies(&candidate.version) {
                continue;
            }
            if let (Some(lock), Some(floor)) = (&self.options.lock_r, &candidate.r_floor) {
                if floor > lock {
                    if lock_skipped.is_none() {
                        lock_skipped = Some((candidate.version.clone(), floor.clone()));
                    }
                    continue;
                }
            }
            let raises_ceiling = match (&ceiling, &candidate.r_floor) {
                (Some(ceiling), Some(floor)) => floor > ceiling,
                _ => false,
            };
            if raises_ceiling {
                raises.push(candidate);
            } else {
                fits.push(candidate);
            }
        }

        fits.extend(raises);
        Ok(Filtered {
            candidates: fits,
            lock_skipped,
        })
    }

    /// Try candidates of the top frame from its cursor onward
    fn commit_top(&mut self) -> Result<StepOutcome> {
        let frame_idx = self.stack.len() - 1;
        loop {
            let (name, candidate) = {
                let frame = &self.stack[frame_idx];
                match frame.candidates.get(frame.next) {
                    Some(candidate) => (frame.name.clone(), candidate.clone()),
                    None => return Ok(StepOutcome::Exhausted),
                }
            };

            self.check_cancelled()?;
            debug!("trying {} {}", name, candidate.version);

            if self.apply_candidate(frame_idx, &name, &candidate)? {
                return Ok(StepOutcome::Committed);
            }

            self.undo_frame(frame_idx);
            self.stack[frame_idx].next += 1;
        }
    }

    /// Commit one candidate: record the assignment and propagate its edges.
    /// Returns false (with nothing half-applied beyond the undo log) when an
    /// edge contradicts an already assigned candidate.
    fn apply_candidate(
        &mut self,
        frame_idx: usize,
        name: &str,
        candidate: &Candidate,
    ) -> Result<bool> {
        self.assigned.insert(name.to_string(), candidate.clone());

        let parent_label = format!("{}@{}", name, candidate.version);
        let parent_blame = self.stack[frame_idx].entry.blame.clone();

        let edges: Vec<_> = candidate
            .active_edges(self.options.include_optional)
            .cloned()
            .collect();

        for edge in edges {
            let link = BlameLink {
                parent: parent_label.clone(),
                kind: edge.kind,
                constraint: edge.constraint.clone(),
                target: edge.name.clone(),
            };

            if let Some(chosen) = self.assigned.get(&edge.name) {
                if !edge.constraint.satisfies(&chosen.version) {
                    debug!(
                        "edge {} rejects assigned {} {}",
                        link, edge.name, chosen.version
                    );
                    let mut chain = parent_blame.clone();
                    chain.push(link);
                    self.note_dead_end(DeadEnd {
                        name: edge.name.clone(),
                        constraint: edge.constraint.clone(),
                        chain,
                        lock_floor: None,
                    });
                    return Ok(false);
                }
                continue;
            }

            if let Some(existing) = self.open.get_mut(&edge.name) {
                self.stack[frame_idx].merged.push((
                    edge.name.clone(),
                    existing.constraint.clone(),
                    existing.blame.clone(),
                ));
                existing.constraint = existing.constraint.merge(&edge.constraint);
                existing.blame.push(link);
                continue;
            }

            let package = self.route_edge(candidate, &edge.name)?;
            let mut blame = parent_blame.clone();
            blame.push(link);
            self.open.insert(
                edge.name.clone(),
                OpenEntry {
                    package,
                    constraint: edge.constraint.clone(),
                    blame,
                    is_root: false,
                },
            );
            self.stack[frame_idx].opened.push(edge.name.clone());
        }

        Ok(true)
    }

    /// Fix the source of a transitively discovered name
    ///
    /// A Bioconductor parent keeps its dependencies in the same release when
    /// the release carries them; everything else resolves against CRAN.
    /// GitHub refs are never synthesized for edges.
    fn route_edge(&self, parent: &Candidate, name: &str) -> Result<PackageRef> {
        if let Some(release) = &parent.bioc_release {
            let bioc_ref = PackageRef::bioc(name, release.clone());
            if !self.provider.candidates(&bioc_ref)?.is_empty() {
                return Ok(bioc_ref);
            }
        }
        Ok(PackageRef::cran(name))
    }

    /// Undo the current commit of a frame (assignment, merges, opens)
    fn undo_frame(&mut self, frame_idx: usize) {
        let frame = &mut self.stack[frame_idx];
        self.assigned.remove(&frame.name);
        for (name, constraint, blame) in frame.merged.drain(..).rev() {
            if let Some(entry) = self.open.get_mut(&name) {
                entry.constraint = constraint;
                entry.blame = blame;
            }
        }
        for name in frame.opened.drain(..).rev() {
            self.open.remove(&name);
        }
    }

    /// Unwind after a dead end: pop exhausted frames, advance the nearest
    /// frame that still has candidates. Returns false when the search space
    /// is exhausted.
    fn pop_and_retry(&mut self) -> Result<bool> {
        while let Some(frame) = self.stack.last() {
            let exhausted_entry = frame.entry.clone();
            let name = frame.name.clone();

            // The frame's current commit is still applied; undo before
            // advancing or popping.
            let frame_idx = self.stack.len() - 1;
            self.undo_frame(frame_idx);
            self.stack[frame_idx].next += 1;

            match self.commit_top()? {
                StepOutcome::Committed => return Ok(true),
                StepOutcome::Exhausted => {
                    debug!("exhausted candidates for {}", name);
                    self.note_dead_end(DeadEnd {
                        name: name.clone(),
                        constraint: exhausted_entry.constraint.clone(),
                        chain: exhausted_entry.blame.clone(),
                        lock_floor: None,
                    });
                    self.stack.pop();
                    self.open.insert(name, exhausted_entry);
                }
            }
        }
        Ok(false)
    }

    fn record_dead_end(&mut self, name: &str, entry: &OpenEntry, filtered: &Filtered) {
        self.note_dead_end(DeadEnd {
            name: name.to_string(),
            constraint: entry.constraint.clone(),
            chain: entry.blame.clone(),
            lock_floor: filtered.lock_skipped.as_ref().map(|(_, floor)| floor.clone()),
        });
    }

    /// Keep the most specific dead end: longest blame chain wins, first
    /// observation wins ties (keeps the surfaced conflict deterministic).
    fn note_dead_end(&mut self, dead_end: DeadEnd) {
        let better = match &self.best_dead_end {
            Some(best) => dead_end.chain.len() > best.chain.len(),
            None => true,
        };
        if better {
            self.best_dead_end = Some(dead_end);
        }
    }

    fn surface_conflict(&self) -> Error {
        match &self.best_dead_end {
            Some(dead_end) => {
                if let (Some(lock), Some(floor)) = (&self.options.lock_r, &dead_end.lock_floor) {
                    return Error::RLockUnsatisfiable {
                        name: dead_end.name.clone(),
                        lock: lock.to_string(),
                        floor: floor.to_string(),
                    };
                }
                Error::VersionConflict {
                    name: dead_end.name.clone(),
                    detail: format!(
                        "no candidate satisfies {} (via {})",
                        dead_end.constraint,
                        format_chain(&dead_end.chain)
                    ),
                    chain: dead_end.chain.clone(),
                }
            }
            None => Error::VersionConflict {
                name: String::new(),
                detail: "resolution failed without a recorded conflict".to_string(),
                chain: Vec::new(),
            },
        }
    }

    /// Assemble the final solution from the completed assignment
    fn build_solution(&self) -> Result<Solution> {
        let max_floor = self
            .assigned
            .values()
            .filter_map(|candidate| candidate.r_floor.clone())
            .max();

        let r_version = match (&self.options.lock_r, &self.options.current_r) {
            (Some(lock), _) => Some(lock.clone()),
            (None, Some(current)) => Some(match &max_floor {
                Some(floor) if floor > current => floor.clone(),
                _ => current.clone(),
            }),
            (None, None) => max_floor.clone(),
        };

        let mut downgrades = Vec::new();

        // Packages pinned down because the R lock rejected a newer candidate
        if let Some(lock) = &self.options.lock_r {
            let mut skipped: BTreeMap<&str, &(RVersion, RVersion)> = BTreeMap::new();
            for frame in &self.stack {
                if let Some(pair) = &frame.lock_skipped {
                    skipped.insert(frame.name.as_str(), pair);
                }
            }
            for (name, candidate) in &self.assigned {
                if let Some((version, floor)) = skipped.get(name.as_str()) {
                    if *version > candidate.version {
                        downgrades.push(DowngradeEntry {
                            name: name.clone(),
                            from: version.to_string(),
                            to: candidate.version.to_string(),
                            reason: format!("requires R >= {}, above the R {} lock", floor, lock),
                        });
                    }
                }
            }
        }

        // Packages whose floor forced the R runtime above current_r
        if let (Some(current), Some(chosen)) = (&self.options.current_r, &r_version) {
            if chosen > current {
                for (name, candidate) in &self.assigned {
                    if let Some(floor) = &candidate.r_floor {
                        if floor > current {
                            downgrades.push(DowngradeEntry {
                                name: name.clone(),
                                from: current.to_string(),
                                to: floor.to_string(),
                                reason: format!("needs R >= {}", floor),
                            });
                        }
                    }
                }
            }
        }

        Ok(Solution {
            assignment: self.assigned.clone(),
            r_version,
            downgrades,
            source_summary: SourceSummary::tally(self.assigned.values()),
        })
    }
}
