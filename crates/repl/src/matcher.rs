//! Fuzzy ranking of completion candidates.

use crate::candidates::{Candidate, CandidateKind};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

/// Commands available in command mode.
pub const COMMANDS: [&str; 5] = ["help", "list", "edit", "clear", "quit"];

/// A candidate that survived filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub candidate: Candidate,
    pub score: i64,
    /// Byte offsets into the name of the matched characters.
    pub positions: Vec<usize>,
}

impl Match {
    fn unscored(candidate: Candidate) -> Self {
        Self {
            candidate,
            score: 0,
            positions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.candidate.name
    }
}

/// The command set as candidates.
pub fn command_candidates() -> Vec<Candidate> {
    COMMANDS
        .iter()
        .map(|name| Candidate {
            name: (*name).to_string(),
            kind: CandidateKind::Builtin,
            callable: false,
        })
        .collect()
}

pub struct MatchEngine {
    matcher: SkimMatcherV2,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchEngine {
    pub fn new() -> Self {
        Self {
            matcher: SkimMatcherV2::default(),
        }
    }

    /// Command-mode matching: fuzzy filter only, nothing for an empty word.
    pub fn match_commands(&self, word: &str) -> Vec<Match> {
        self.fuzzy(word, &command_candidates())
    }

    /// Evaluation-mode matching.
    ///
    /// An empty word after a non-empty parent browses every child in source
    /// order. Results are then stable-sorted by candidate priority.
    pub fn match_eval(&self, word: &str, parent: &str, candidates: &[Candidate]) -> Vec<Match> {
        let mut matches = if word.is_empty() && !parent.is_empty() && !candidates.is_empty() {
            candidates.iter().cloned().map(Match::unscored).collect()
        } else {
            self.fuzzy(word, candidates)
        };
        priority_sort(&mut matches);
        matches
    }

    /// Subsequence search ordered by descending score; ties keep input order.
    fn fuzzy(&self, word: &str, candidates: &[Candidate]) -> Vec<Match> {
        if word.is_empty() {
            return Vec::new();
        }
        let mut matches: Vec<Match> = candidates
            .iter()
            .filter_map(|candidate| {
                let (score, indices) = self.matcher.fuzzy_indices(&candidate.name, word)?;
                Some(Match {
                    positions: char_to_byte_positions(&candidate.name, &indices),
                    candidate: candidate.clone(),
                    score,
                })
            })
            .collect();
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches
    }
}

/// Stable reorder: plain bindings, then parameterized bindings, then builtins.
pub fn priority_sort(matches: &mut [Match]) {
    matches.sort_by_key(|m| m.candidate.kind.priority());
}

fn char_to_byte_positions(name: &str, char_indices: &[usize]) -> Vec<usize> {
    name.char_indices()
        .enumerate()
        .filter(|(char_idx, _)| char_indices.contains(char_idx))
        .map(|(_, (byte_idx, _))| byte_idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, kind: CandidateKind) -> Candidate {
        Candidate {
            name: name.to_string(),
            kind,
            callable: kind != CandidateKind::Binding,
        }
    }

    fn names(matches: &[Match]) -> Vec<&str> {
        matches.iter().map(Match::name).collect()
    }

    #[test]
    fn test_commands() {
        let engine = MatchEngine::new();
        assert!(engine.match_commands("").is_empty());
        assert_eq!(names(&engine.match_commands("ed")), vec!["edit"]);
        assert_eq!(names(&engine.match_commands("qu")), vec!["quit"]);
    }

    #[test]
    fn test_browse_mode_lists_children_by_priority() {
        let engine = MatchEngine::new();
        let children = vec![
            candidate("multiply", CandidateKind::ParamBinding),
            candidate("factor", CandidateKind::Binding),
            candidate("inner", CandidateKind::Binding),
        ];
        let matches = engine.match_eval("", "nested", &children);
        assert_eq!(names(&matches), vec!["factor", "inner", "multiply"]);
        assert!(matches.iter().all(|m| m.positions.is_empty()));
    }

    #[test]
    fn test_empty_word_at_top_level_matches_nothing() {
        let engine = MatchEngine::new();
        let all = vec![candidate("greeting", CandidateKind::Binding)];
        assert!(engine.match_eval("", "", &all).is_empty());
    }

    #[test]
    fn test_priority_on_ties() {
        let engine = MatchEngine::new();
        let candidates = vec![
            candidate("map", CandidateKind::Builtin),
            candidate("map", CandidateKind::ParamBinding),
            candidate("map", CandidateKind::Binding),
        ];
        let matches = engine.match_eval("map", "", &candidates);
        let kinds: Vec<_> = matches.iter().map(|m| m.candidate.kind).collect();
        assert_eq!(
            kinds,
            vec![
                CandidateKind::Binding,
                CandidateKind::ParamBinding,
                CandidateKind::Builtin
            ]
        );
    }

    #[test]
    fn test_priority_sort_is_stable() {
        let mut matches = vec![
            Match::unscored(candidate("b1", CandidateKind::Builtin)),
            Match::unscored(candidate("p1", CandidateKind::ParamBinding)),
            Match::unscored(candidate("b2", CandidateKind::Builtin)),
            Match::unscored(candidate("v1", CandidateKind::Binding)),
            Match::unscored(candidate("p2", CandidateKind::ParamBinding)),
        ];
        priority_sort(&mut matches);
        assert_eq!(names(&matches), vec!["v1", "p1", "p2", "b1", "b2"]);
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let engine = MatchEngine::new();
        let candidates = vec![candidate("éa", CandidateKind::Binding)];
        let matches = engine.match_eval("a", "", &candidates);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].positions, vec![2]);
    }

    #[test]
    fn test_non_subsequence_is_filtered() {
        let engine = MatchEngine::new();
        let candidates = vec![
            candidate("greeting", CandidateKind::Binding),
            candidate("add", CandidateKind::ParamBinding),
        ];
        assert_eq!(names(&engine.match_eval("gtg", "", &candidates)), vec!["greeting"]);
    }
}
