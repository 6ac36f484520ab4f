//! Constrained random derangement.
//!
//! Every giver is paired with exactly one recipient so that nobody draws
//! themselves or their own partner. Candidates come from a
//! [`PermutationSource`]; the engine keeps the first one that satisfies
//! every constraint and gives up after a fixed number of attempts.
//!
//! The engine is pure: it performs no I/O and does not log.

use crate::domain::model::{Participant, ParticipantId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Attempts made before a draw is reported as failed.
pub const DEFAULT_MAX_ATTEMPTS: usize = 1000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("Invalid participant list: {reason}")]
    InvalidInput { reason: String },

    #[error("No valid assignment found after {attempts} attempts{}", failure_note(.infeasible))]
    AssignmentFailed { attempts: usize, infeasible: bool },
}

fn failure_note(infeasible: &bool) -> &'static str {
    if *infeasible {
        " (the exclusions leave no valid assignment)"
    } else {
        ""
    }
}

impl AssignmentError {
    fn invalid(reason: impl Into<String>) -> Self {
        AssignmentError::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Supplies candidate recipient orders.
///
/// `next_permutation(n)` returns, for givers `0..n` in input order, the
/// position of each giver's recipient.
pub trait PermutationSource {
    fn next_permutation(&mut self, n: usize) -> Vec<usize>;
}

/// Uniform permutations drawn with a Fisher-Yates shuffle.
#[derive(Debug, Clone)]
pub struct RandomPermutations<R> {
    rng: R,
}

impl<R: Rng> RandomPermutations<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomPermutations<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// Reproducible source: the same seed always yields the same draw.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> PermutationSource for RandomPermutations<R> {
    fn next_permutation(&mut self, n: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..n).collect();
        order.shuffle(&mut self.rng);
        order
    }
}

/// Replays a fixed list of candidates, then keeps returning the identity.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPermutations {
    script: VecDeque<Vec<usize>>,
    served: usize,
}

impl ScriptedPermutations {
    pub fn new<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = Vec<usize>>,
    {
        Self {
            script: candidates.into_iter().collect(),
            served: 0,
        }
    }

    /// Number of candidates handed out so far.
    pub fn served(&self) -> usize {
        self.served
    }
}

impl PermutationSource for ScriptedPermutations {
    fn next_permutation(&mut self, n: usize) -> Vec<usize> {
        self.served += 1;
        self.script
            .pop_front()
            .unwrap_or_else(|| (0..n).collect())
    }
}

/// Giver → recipient mapping. Pairs keep the giver order of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pairs: Vec<(ParticipantId, ParticipantId)>,
    attempts: usize,
}

impl Assignment {
    pub fn pairs(&self) -> &[(ParticipantId, ParticipantId)] {
        &self.pairs
    }

    /// Which attempt produced this assignment (1-based).
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn recipient_of(&self, giver: ParticipantId) -> Option<ParticipantId> {
        self.pairs
            .iter()
            .find(|(g, _)| *g == giver)
            .map(|(_, recipient)| *recipient)
    }

    pub fn to_map(&self) -> BTreeMap<ParticipantId, ParticipantId> {
        self.pairs.iter().copied().collect()
    }

    /// Looks the ids back up in `participants`, giving `(giver, recipient)` records.
    pub fn resolve<'a>(
        &self,
        participants: &'a [Participant],
    ) -> Vec<(&'a Participant, &'a Participant)> {
        let by_id: HashMap<ParticipantId, &Participant> =
            participants.iter().map(|p| (p.id, p)).collect();

        self.pairs
            .iter()
            .filter_map(|(giver, recipient)| Some((*by_id.get(giver)?, *by_id.get(recipient)?)))
            .collect()
    }

    /// True when this is a permutation of `participants` with no self or partner pairs.
    pub fn is_valid_for(&self, participants: &[Participant]) -> bool {
        let Ok(partners) = exclusion_partners(participants) else {
            return false;
        };
        let position: HashMap<ParticipantId, usize> = participants
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id, i))
            .collect();

        let mut candidate = vec![usize::MAX; participants.len()];
        for (giver, recipient) in &self.pairs {
            match (position.get(giver), position.get(recipient)) {
                (Some(&g), Some(&r)) if candidate[g] == usize::MAX => candidate[g] = r,
                _ => return false,
            }
        }
        self.pairs.len() == participants.len() && is_valid_candidate(&partners, &candidate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentEngine {
    max_attempts: usize,
}

impl Default for AssignmentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AssignmentEngine {
    pub fn new() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }

    pub fn with_max_attempts(max_attempts: usize) -> Self {
        Self { max_attempts }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Draws an assignment for `participants` using candidates from `source`.
    ///
    /// Input is checked first (`InvalidInput`), then the exclusions are
    /// checked for feasibility so that impossible groups fail without
    /// consuming a single candidate. Otherwise candidates are tried in order
    /// and the first valid one wins.
    pub fn assign<S>(
        &self,
        participants: &[Participant],
        source: &mut S,
    ) -> Result<Assignment, AssignmentError>
    where
        S: PermutationSource + ?Sized,
    {
        let partners = exclusion_partners(participants)?;

        if !has_valid_assignment(&partners) {
            return Err(AssignmentError::AssignmentFailed {
                attempts: 0,
                infeasible: true,
            });
        }

        for attempt in 1..=self.max_attempts {
            let candidate = source.next_permutation(participants.len());
            if is_valid_candidate(&partners, &candidate) {
                let pairs = participants
                    .iter()
                    .zip(&candidate)
                    .map(|(giver, &recipient)| (giver.id, participants[recipient].id))
                    .collect();
                return Ok(Assignment {
                    pairs,
                    attempts: attempt,
                });
            }
        }

        Err(AssignmentError::AssignmentFailed {
            attempts: self.max_attempts,
            infeasible: false,
        })
    }
}

/// Checks the participant list and returns, per position, the position of
/// that participant's partner.
fn exclusion_partners(participants: &[Participant]) -> Result<Vec<Option<usize>>, AssignmentError> {
    if participants.len() < 2 {
        return Err(AssignmentError::invalid(format!(
            "need at least 2 participants, found {}",
            participants.len()
        )));
    }

    let mut seen_ids = HashSet::with_capacity(participants.len());
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();

    for (position, participant) in participants.iter().enumerate() {
        if !seen_ids.insert(participant.id) {
            return Err(AssignmentError::invalid(format!(
                "participant id {} appears more than once",
                participant.id
            )));
        }

        if let Some(group) = participant.exclusion_group.as_deref() {
            if group.trim().is_empty() {
                return Err(AssignmentError::invalid(format!(
                    "participant '{}' has an empty exclusion group",
                    participant.name
                )));
            }
            groups.entry(group).or_default().push(position);
        }
    }

    let mut partners = vec![None; participants.len()];
    for (group, members) in &groups {
        match members.as_slice() {
            [_] => {}
            [a, b] => {
                partners[*a] = Some(*b);
                partners[*b] = Some(*a);
            }
            _ => {
                return Err(AssignmentError::invalid(format!(
                    "exclusion group '{}' has {} members, at most 2 are allowed",
                    group,
                    members.len()
                )))
            }
        }
    }

    Ok(partners)
}

fn is_allowed(partners: &[Option<usize>], giver: usize, recipient: usize) -> bool {
    giver != recipient && partners[giver] != Some(recipient)
}

fn is_valid_candidate(partners: &[Option<usize>], candidate: &[usize]) -> bool {
    let n = partners.len();
    if candidate.len() != n {
        return false;
    }

    let mut taken = vec![false; n];
    for (giver, &recipient) in candidate.iter().enumerate() {
        if recipient >= n || taken[recipient] || !is_allowed(partners, giver, recipient) {
            return false;
        }
        taken[recipient] = true;
    }
    true
}

/// Exact feasibility: a valid assignment exists iff the giver/recipient
/// compatibility graph has a perfect matching (Kuhn's augmenting paths).
fn has_valid_assignment(partners: &[Option<usize>]) -> bool {
    let n = partners.len();
    let mut giver_of: Vec<Option<usize>> = vec![None; n];

    (0..n).all(|giver| {
        let mut visited = vec![false; n];
        augment(partners, giver, &mut visited, &mut giver_of)
    })
}

fn augment(
    partners: &[Option<usize>],
    giver: usize,
    visited: &mut [bool],
    giver_of: &mut [Option<usize>],
) -> bool {
    for recipient in 0..partners.len() {
        if visited[recipient] || !is_allowed(partners, giver, recipient) {
            continue;
        }
        visited[recipient] = true;

        let free = match giver_of[recipient] {
            None => true,
            Some(current) => augment(partners, current, visited, giver_of),
        };
        if free {
            giver_of[recipient] = Some(giver);
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn singles(names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Participant::single(i as u32, *name, format!("91000000{}", i)))
            .collect()
    }

    fn couple_ab_with_singles(extra: &[&str]) -> Vec<Participant> {
        let mut people = vec![
            Participant::in_group(0, "A", "910000000", "couple0"),
            Participant::in_group(1, "B", "910000001", "couple0"),
        ];
        for (i, name) in extra.iter().enumerate() {
            people.push(Participant::single(i as u32 + 2, *name, format!("92000000{}", i)));
        }
        people
    }

    #[test]
    fn test_four_singles_produce_a_derangement() {
        let people = singles(&["A", "B", "C", "D"]);
        let mut source = RandomPermutations::seeded(7);

        let assignment = AssignmentEngine::new().assign(&people, &mut source).unwrap();

        assert_eq!(assignment.len(), 4);
        assert!(assignment.is_valid_for(&people));
        for (giver, recipient) in assignment.pairs() {
            assert_ne!(giver, recipient);
        }
    }

    #[test]
    fn test_couple_never_draws_each_other() {
        let people = couple_ab_with_singles(&["C", "D"]);
        let engine = AssignmentEngine::new();

        for seed in 0..200 {
            let mut source = RandomPermutations::seeded(seed);
            let assignment = engine.assign(&people, &mut source).unwrap();
            assert_ne!(assignment.recipient_of(ParticipantId(0)), Some(ParticipantId(1)));
            assert_ne!(assignment.recipient_of(ParticipantId(1)), Some(ParticipantId(0)));
        }
    }

    #[test]
    fn test_two_person_couple_fails_without_consuming_candidates() {
        let people = couple_ab_with_singles(&[]);
        let mut source = ScriptedPermutations::new(vec![vec![1, 0]]);

        let err = AssignmentEngine::new().assign(&people, &mut source).unwrap_err();

        assert_eq!(
            err,
            AssignmentError::AssignmentFailed {
                attempts: 0,
                infeasible: true
            }
        );
        assert_eq!(source.served(), 0);
    }

    #[test]
    fn test_three_people_with_a_couple_is_infeasible() {
        let people = couple_ab_with_singles(&["C"]);
        let mut source = RandomPermutations::seeded(1);

        let err = AssignmentEngine::new().assign(&people, &mut source).unwrap_err();
        assert!(matches!(
            err,
            AssignmentError::AssignmentFailed {
                infeasible: true,
                ..
            }
        ));
    }

    #[test]
    fn test_first_valid_scripted_candidate_wins() {
        let people = singles(&["A", "B", "C"]);
        let mut source = ScriptedPermutations::new(vec![
            vec![0, 1, 2], // everyone draws themselves
            vec![1, 0, 2], // C draws C
            vec![1, 2, 0], // valid
            vec![2, 0, 1], // also valid, must be ignored
        ]);

        let assignment = AssignmentEngine::new().assign(&people, &mut source).unwrap();

        assert_eq!(assignment.attempts(), 3);
        assert_eq!(source.served(), 3);
        assert_eq!(assignment.recipient_of(ParticipantId(0)), Some(ParticipantId(1)));
        assert_eq!(assignment.recipient_of(ParticipantId(1)), Some(ParticipantId(2)));
        assert_eq!(assignment.recipient_of(ParticipantId(2)), Some(ParticipantId(0)));
    }

    #[test]
    fn test_non_permutation_candidates_are_rejected() {
        let people = singles(&["A", "B", "C"]);
        let mut source = ScriptedPermutations::new(vec![
            vec![1, 1, 0],    // B drawn twice
            vec![1, 2],       // too short
            vec![1, 2, 7],    // out of range
            vec![2, 0, 1],
        ]);

        let assignment = AssignmentEngine::new().assign(&people, &mut source).unwrap();
        assert_eq!(assignment.attempts(), 4);
    }

    #[test]
    fn test_exhausting_the_bound_reports_failure() {
        let people = singles(&["A", "B", "C", "D"]);
        let mut source = ScriptedPermutations::new(Vec::<Vec<usize>>::new());

        let err = AssignmentEngine::with_max_attempts(25)
            .assign(&people, &mut source)
            .unwrap_err();

        assert_eq!(
            err,
            AssignmentError::AssignmentFailed {
                attempts: 25,
                infeasible: false
            }
        );
        assert_eq!(source.served(), 25);
    }

    #[test]
    fn test_too_few_participants_is_invalid_input() {
        let people = singles(&["A"]);
        let mut source = RandomPermutations::seeded(0);

        let err = AssignmentEngine::new().assign(&people, &mut source).unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidInput { .. }));
        assert!(err.to_string().contains("at least 2"));
    }

    #[test]
    fn test_group_of_three_is_invalid_input() {
        let people = vec![
            Participant::in_group(0, "A", "1", "family"),
            Participant::in_group(1, "B", "2", "family"),
            Participant::in_group(2, "C", "3", "family"),
            Participant::single(3, "D", "4"),
        ];
        let mut source = RandomPermutations::seeded(0);

        let err = AssignmentEngine::new().assign(&people, &mut source).unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidInput { .. }));
        assert!(err.to_string().contains("family"));
    }

    #[test]
    fn test_duplicate_ids_are_invalid_input() {
        let people = vec![
            Participant::single(0, "A", "1"),
            Participant::single(0, "B", "2"),
            Participant::single(1, "C", "3"),
        ];
        let mut source = RandomPermutations::seeded(0);

        let err = AssignmentEngine::new().assign(&people, &mut source).unwrap_err();
        assert!(matches!(err, AssignmentError::InvalidInput { .. }));
    }

    #[test]
    fn test_singleton_group_behaves_like_no_group() {
        let people = vec![
            Participant::in_group(0, "A", "1", "solo"),
            Participant::single(1, "B", "2"),
        ];
        let mut source = ScriptedPermutations::new(vec![vec![1, 0]]);

        let assignment = AssignmentEngine::new().assign(&people, &mut source).unwrap();
        assert_eq!(assignment.recipient_of(ParticipantId(0)), Some(ParticipantId(1)));
    }

    #[test]
    fn test_resolve_returns_participant_records() {
        let people = singles(&["Ana", "Rui", "Zé"]);
        let mut source = ScriptedPermutations::new(vec![vec![2, 0, 1]]);

        let assignment = AssignmentEngine::new().assign(&people, &mut source).unwrap();
        let resolved: Vec<(&str, &str)> = assignment
            .resolve(&people)
            .into_iter()
            .map(|(g, r)| (g.name.as_str(), r.name.as_str()))
            .collect();

        assert_eq!(resolved, vec![("Ana", "Zé"), ("Rui", "Ana"), ("Zé", "Rui")]);
    }

    #[test]
    fn test_same_seed_same_draw() {
        let people = singles(&["A", "B", "C", "D", "E", "F"]);
        let engine = AssignmentEngine::new();

        let first = engine
            .assign(&people, &mut RandomPermutations::seeded(2024))
            .unwrap();
        let second = engine
            .assign(&people, &mut RandomPermutations::seeded(2024))
            .unwrap();

        assert_eq!(first, second);
    }
}
