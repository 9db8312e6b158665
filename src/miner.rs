//! Nonce search
//!
//! Sequential proof-of-work search: bump the nonce, re-encode the block,
//! hash it and count leading zero bits until the difficulty is met. The loop
//! is unbounded unless a [`SearchPolicy`] sets an attempt limit or deadline.

use crate::crypto::{Digest, Sha256Hasher, DIGEST_BITS};
use crate::encoding::encode_into;
use crate::utils::{format_duration, format_hash_rate};
use crate::{Block, Error, Problem, Result, Solution};
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span};

/// The deadline is only sampled every this many attempts
const DEADLINE_CHECK_INTERVAL: u64 = 4096;

/// Default number of attempts between progress log lines
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 1_000_000;

/// When to give up searching
///
/// The default is unbounded: the loop runs until the difficulty is met.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchPolicy {
    /// Maximum number of hash attempts
    pub max_attempts: Option<u64>,
    /// Maximum wall-clock time spent searching
    pub deadline: Option<Duration>,
}

impl SearchPolicy {
    /// Search until a solution is found
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Limit the number of hash attempts
    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Limit the wall-clock search time
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Whether neither bound is set
    pub fn is_unbounded(&self) -> bool {
        self.max_attempts.is_none() && self.deadline.is_none()
    }
}

/// Running statistics for a search
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SearchStats {
    /// Hashes computed so far
    pub attempts: u64,
    /// Time spent searching
    pub elapsed: Duration,
}

impl SearchStats {
    /// Hashes per second over the whole search
    pub fn hash_rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.attempts as f64 / secs
        } else {
            0.0
        }
    }
}

/// Result of a successful search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Nonce to submit
    pub solution: Solution,
    /// The block with the winning nonce embedded
    pub block: Block,
    /// Digest of the winning encoding
    pub digest: Digest,
    /// Leading zero bits of `digest`
    pub leading_zero_bits: u32,
    /// Attempts and elapsed time
    pub stats: SearchStats,
}

/// Sequential nonce searcher
#[derive(Debug, Clone)]
pub struct Miner {
    policy: SearchPolicy,
    progress_interval: u64,
}

impl Miner {
    /// Create a miner with the given stopping policy
    pub fn new(policy: SearchPolicy) -> Self {
        Self {
            policy,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }

    /// Log progress every `interval` attempts; 0 disables progress logging
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    /// The stopping policy in use
    pub fn policy(&self) -> &SearchPolicy {
        &self.policy
    }

    /// Search for a nonce meeting the problem's difficulty
    ///
    /// Starts from the block's current nonce. With difficulty 0 that nonce is
    /// returned as-is without any increment.
    pub fn solve(&self, problem: Problem) -> Result<SearchOutcome> {
        let Problem { difficulty, mut block } = problem;

        let span = info_span!("search", difficulty, records = block.data.len());
        let _enter = span.enter();

        if difficulty > DIGEST_BITS {
            return Err(Error::decoding(format!(
                "difficulty {} exceeds the {}-bit digest width",
                difficulty, DIGEST_BITS
            )));
        }

        info!(
            start_nonce = %block.nonce,
            unbounded = self.policy.is_unbounded(),
            "Starting nonce search"
        );

        let start = Instant::now();
        let deadline = self.policy.deadline.and_then(|d| start.checked_add(d));
        let mut hasher = Sha256Hasher::new();
        let mut buf = Vec::new();
        let mut attempts = 0u64;
        let mut leading_zeros = 0u32;
        let mut last_digest = None;

        while leading_zeros < difficulty {
            if let Some(max_attempts) = self.policy.max_attempts {
                if attempts >= max_attempts {
                    return Err(Error::search_exhausted(
                        attempts,
                        format!("attempt limit of {} reached", max_attempts),
                    ));
                }
            }

            if attempts % DEADLINE_CHECK_INTERVAL == 0 {
                if let (Some(deadline), Some(limit)) = (deadline, self.policy.deadline) {
                    if Instant::now() >= deadline {
                        return Err(Error::search_exhausted(
                            attempts,
                            format!("deadline of {} passed", format_duration(limit)),
                        ));
                    }
                }
            }

            block.nonce = block.nonce.checked_next().ok_or_else(|| {
                Error::search_exhausted(attempts, "nonce overflowed the signed 64-bit range")
            })?;

            encode_into(&block, &mut buf)?;
            let digest = hasher.hash(&buf);
            leading_zeros = digest.leading_zero_bits();
            last_digest = Some(digest);
            attempts += 1;

            if self.progress_interval > 0 && attempts % self.progress_interval == 0 {
                let stats = SearchStats {
                    attempts,
                    elapsed: start.elapsed(),
                };
                debug!(
                    attempts,
                    nonce = %block.nonce,
                    hash_rate = %format_hash_rate(stats.hash_rate()),
                    "Search progress"
                );
            }
        }

        let digest = match last_digest {
            Some(digest) => digest,
            None => {
                encode_into(&block, &mut buf)?;
                hasher.hash(&buf)
            }
        };

        let leading_zero_bits = digest.leading_zero_bits();
        let stats = SearchStats {
            attempts,
            elapsed: start.elapsed(),
        };

        info!(
            nonce = %block.nonce,
            digest = %digest,
            leading_zero_bits,
            attempts,
            elapsed = %format_duration(stats.elapsed),
            hash_rate = %format_hash_rate(stats.hash_rate()),
            "Found solution"
        );

        Ok(SearchOutcome {
            solution: Solution::new(block.nonce),
            leading_zero_bits,
            digest,
            block,
            stats,
        })
    }
}

impl Default for Miner {
    fn default() -> Self {
        Self::new(SearchPolicy::unbounded())
    }
}

/// Solve with an unbounded policy
pub fn solve(problem: Problem) -> Result<SearchOutcome> {
    Miner::default().solve(problem)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{leading_zero_bits, sha256};
    use crate::encoding::encode_block;
    use crate::{Field, Nonce};
    use assert_matches::assert_matches;

    fn example_block() -> Block {
        Block::new(vec![vec![
            Field::from("7777abe2d01e57743988e9667382508f"),
            Field::from(-30),
        ]])
    }

    fn zeros_for(block: &Block) -> u32 {
        leading_zero_bits(&sha256(&encode_block(block).unwrap()))
    }

    #[test]
    fn test_difficulty_zero_returns_start_nonce() {
        let outcome = solve(Problem::new(0, example_block())).unwrap();
        assert_eq!(outcome.solution.nonce, Nonce::new(0));
        assert_eq!(outcome.stats.attempts, 0);

        let start = example_block().with_nonce(Nonce::new(41));
        let outcome = solve(Problem::new(0, start)).unwrap();
        assert_eq!(outcome.solution.nonce, Nonce::new(41));
        assert_eq!(outcome.digest, sha256(&encode_block(&outcome.block).unwrap()));
    }

    #[test]
    fn test_finds_first_satisfying_nonce() {
        let outcome = solve(Problem::new(8, example_block())).unwrap();
        let nonce = outcome.solution.nonce.value();

        assert!(nonce >= 1);
        assert_eq!(outcome.stats.attempts, nonce as u64);
        assert!(outcome.leading_zero_bits >= 8);
        assert_eq!(zeros_for(&outcome.block), outcome.leading_zero_bits);

        for earlier in 1..nonce {
            let block = example_block().with_nonce(Nonce::new(earlier));
            assert!(zeros_for(&block) < 8, "nonce {} already met the difficulty", earlier);
        }
    }

    #[test]
    fn test_data_untouched_by_search() {
        let outcome = solve(Problem::new(4, example_block())).unwrap();
        assert_eq!(outcome.block.data, example_block().data);
    }

    #[test]
    fn test_negative_start_nonce() {
        let start = example_block().with_nonce(Nonce::new(-100));
        let outcome = solve(Problem::new(4, start)).unwrap();
        assert!(outcome.solution.nonce.value() > -100);
        assert!(zeros_for(&outcome.block) >= 4);
    }

    #[test]
    fn test_attempt_limit() {
        let miner = Miner::new(SearchPolicy::unbounded().with_max_attempts(16));
        let err = miner.solve(Problem::new(256, example_block())).unwrap_err();
        assert_matches!(err, Error::SearchExhausted { attempts: 16, .. });
    }

    #[test]
    fn test_deadline() {
        let miner = Miner::new(SearchPolicy::unbounded().with_deadline(Duration::ZERO));
        let err = miner.solve(Problem::new(256, example_block())).unwrap_err();
        assert_matches!(err, Error::SearchExhausted { attempts: 0, .. });
    }

    #[test]
    fn test_nonce_overflow() {
        let start = example_block().with_nonce(Nonce::new(i64::MAX));
        let err = solve(Problem::new(1, start)).unwrap_err();
        assert_matches!(err, Error::SearchExhausted { attempts: 0, .. });
    }

    #[test]
    fn test_unreachable_difficulty() {
        let err = solve(Problem::new(257, example_block())).unwrap_err();
        assert_matches!(err, Error::Decoding { .. });
    }

    #[test]
    fn test_hash_rate() {
        let stats = SearchStats {
            attempts: 1000,
            elapsed: Duration::from_secs(10),
        };
        assert_eq!(stats.hash_rate(), 100.0);
        assert_eq!(SearchStats::default().hash_rate(), 0.0);
    }

    #[test]
    fn test_policy_builders() {
        assert!(SearchPolicy::unbounded().is_unbounded());
        let policy = SearchPolicy::unbounded()
            .with_max_attempts(5)
            .with_deadline(Duration::from_secs(1));
        assert!(!policy.is_unbounded());
        assert_eq!(policy.max_attempts, Some(5));
    }
}
