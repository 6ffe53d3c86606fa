/*
 * Mailbox Configuration
 *
 * The core count (N) and per-channel queue depth (D) are fixed when the
 * mailbox is built and never change for the lifetime of the run.
 *
 * Limits:
 * - N is bounded by MAX_CORES because the readiness bitmask is one u64
 * - D must be at least 1; unbounded queues are deliberately not offered
 * - MEMORY operations always use a depth of MEMORY_SLOT_DEPTH
 */

use crate::error::{ConfigError, MailboxError};
use crate::types::CoreId;

/// Widest readiness bitmask a POLL_ANY can return
pub const MAX_CORES: usize = 64;

/// Core count of the demo platform
pub const DEFAULT_CORES: usize = 4;

/// Per-channel depth used when none is given
///
/// The broadcast demo pushes eight words per hart before stalling.
pub const DEFAULT_QUEUE_DEPTH: usize = 8;

/// Depth of the MEMORY single-slot mailboxes
pub const MEMORY_SLOT_DEPTH: usize = 1;

/// Validated mailbox parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxConfig {
    cores: usize,
    queue_depth: usize,
}

impl MailboxConfig {
    /// Build a configuration, rejecting values the matrix cannot model
    pub fn new(cores: usize, queue_depth: usize) -> Result<Self, ConfigError> {
        if cores == 0 {
            return Err(ConfigError::NoCores);
        }
        if cores > MAX_CORES {
            return Err(ConfigError::TooManyCores {
                requested: cores,
                max: MAX_CORES,
            });
        }
        if queue_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(Self { cores, queue_depth })
    }

    pub fn cores(&self) -> usize {
        self.cores
    }

    pub fn queue_depth(&self) -> usize {
        self.queue_depth
    }

    /// Check that `core` names one of the configured harts
    pub fn check_core(&self, core: CoreId) -> Result<usize, MailboxError> {
        let index = core.as_usize();
        if index < self.cores {
            Ok(index)
        } else {
            Err(MailboxError::InvalidCore {
                core,
                cores: self.cores,
            })
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            cores: DEFAULT_CORES,
            queue_depth: DEFAULT_QUEUE_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_parameters() {
        assert_eq!(MailboxConfig::new(0, 1), Err(ConfigError::NoCores));
        assert_eq!(
            MailboxConfig::new(65, 1),
            Err(ConfigError::TooManyCores { requested: 65, max: 64 })
        );
        assert_eq!(MailboxConfig::new(4, 0), Err(ConfigError::ZeroDepth));
    }

    #[test]
    fn test_check_core() {
        let config = MailboxConfig::new(4, 2).unwrap();
        assert_eq!(config.check_core(CoreId(3)), Ok(3));
        assert_eq!(
            config.check_core(CoreId(4)),
            Err(MailboxError::InvalidCore { core: CoreId(4), cores: 4 })
        );
    }

    #[test]
    fn test_default_matches_demo_platform() {
        let config = MailboxConfig::default();
        assert_eq!(config.cores(), 4);
        assert_eq!(config.queue_depth(), DEFAULT_QUEUE_DEPTH);
    }
}
