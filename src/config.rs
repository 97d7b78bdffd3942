//! Framing configuration.
//!
//! [`FrameTypeCheck`] is the process-wide switch controlling whether
//! [`FrameHeaderCodec::assert_type`](crate::frame::FrameHeaderCodec::assert_type)
//! reports mismatches. It is read once from the environment and never changes
//! afterwards; codecs copy the value at construction. [`FramingConfig`]
//! gathers the per-connection limits used to build fragmenters, reassemblers,
//! and connections.

use std::{num::NonZeroUsize, sync::OnceLock};

use crate::{
    byte_order::U24_MAX,
    frame::{FrameHeaderCodec, HEADER_SIZE, METADATA_LENGTH_SIZE},
};

/// Environment variable that disables frame type assertions when truthy.
pub const DISABLE_FRAME_TYPE_CHECK_ENV: &str = "RSOCKET_DISABLE_FRAME_TYPE_CHECK";

/// Whether frame type assertions are enforced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrameTypeCheck {
    /// Mismatches are reported as protocol violations.
    #[default]
    Enabled,
    /// Mismatches are not looked for.
    Disabled,
}

impl FrameTypeCheck {
    /// Interpret the value of [`DISABLE_FRAME_TYPE_CHECK_ENV`].
    ///
    /// `true`, `1` and `yes` (any case) disable the check; anything else,
    /// including an unset variable, leaves it enabled.
    ///
    /// # Examples
    ///
    /// ```
    /// use rsocket_frame::config::FrameTypeCheck;
    ///
    /// assert_eq!(FrameTypeCheck::from_env_value(Some("TRUE")), FrameTypeCheck::Disabled);
    /// assert_eq!(FrameTypeCheck::from_env_value(None), FrameTypeCheck::Enabled);
    /// ```
    #[must_use]
    pub fn from_env_value(value: Option<&str>) -> Self {
        let disabled = value.is_some_and(|raw| {
            let raw = raw.trim();
            ["true", "1", "yes"]
                .iter()
                .any(|truthy| raw.eq_ignore_ascii_case(truthy))
        });
        if disabled { Self::Disabled } else { Self::Enabled }
    }

    /// Process-wide setting, read from the environment on first use.
    #[must_use]
    pub fn process_default() -> Self {
        static CHECK: OnceLock<FrameTypeCheck> = OnceLock::new();
        *CHECK.get_or_init(|| {
            let value = std::env::var(DISABLE_FRAME_TYPE_CHECK_ENV).ok();
            let check = Self::from_env_value(value.as_deref());
            if check == Self::Disabled {
                tracing::info!("frame type assertions disabled by environment");
            }
            check
        })
    }

    /// Whether assertions are enforced.
    #[must_use]
    pub const fn is_enabled(self) -> bool { matches!(self, Self::Enabled) }
}

/// Smallest fragment bound accepted by [`FramingConfig::new`]: a header, the
/// largest fixed field, a metadata length and one byte of content.
pub const MIN_FRAGMENT_SIZE: usize = HEADER_SIZE + 4 + METADATA_LENGTH_SIZE + 1;

/// Largest frame a 24-bit frame length field can describe.
pub const MAX_FRAME_SIZE: usize = U24_MAX as usize;

const DEFAULT_MAX_ASSEMBLED_SIZE: usize = 16 * 1024 * 1024;

/// Limits applied to one connection's framing pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramingConfig {
    /// Frames larger than this are fragmented; `None` disables fragmentation.
    pub max_fragment_size: Option<NonZeroUsize>,
    /// Hard cap on a reassembled frame.
    pub max_assembled_size: NonZeroUsize,
    /// Type assertion setting handed to every codec built from this config.
    pub type_check: FrameTypeCheck,
}

impl FramingConfig {
    /// Build a configuration that fragments at `max_fragment_size`.
    ///
    /// Returns `None` when `max_fragment_size` is below [`MIN_FRAGMENT_SIZE`]
    /// or above [`MAX_FRAME_SIZE`], when `max_assembled_size` is zero, or when
    /// a single fragment could exceed `max_assembled_size`.
    #[must_use]
    pub fn new(max_fragment_size: usize, max_assembled_size: usize) -> Option<Self> {
        if !(MIN_FRAGMENT_SIZE..=MAX_FRAME_SIZE).contains(&max_fragment_size)
            || max_fragment_size > max_assembled_size
        {
            return None;
        }
        Some(Self {
            max_fragment_size: NonZeroUsize::new(max_fragment_size),
            max_assembled_size: NonZeroUsize::new(max_assembled_size)?,
            type_check: FrameTypeCheck::process_default(),
        })
    }

    /// Override the type assertion setting.
    #[must_use]
    pub const fn with_type_check(mut self, type_check: FrameTypeCheck) -> Self {
        self.type_check = type_check;
        self
    }

    /// Header codec honouring this configuration.
    #[must_use]
    pub const fn codec(&self) -> FrameHeaderCodec { FrameHeaderCodec::new(self.type_check) }
}

impl Default for FramingConfig {
    fn default() -> Self {
        Self {
            max_fragment_size: None,
            max_assembled_size: NonZeroUsize::new(DEFAULT_MAX_ASSEMBLED_SIZE)
                .unwrap_or(NonZeroUsize::MIN),
            type_check: FrameTypeCheck::process_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Some("true"), FrameTypeCheck::Disabled)]
    #[case(Some(" Yes "), FrameTypeCheck::Disabled)]
    #[case(Some("1"), FrameTypeCheck::Disabled)]
    #[case(Some("false"), FrameTypeCheck::Enabled)]
    #[case(Some(""), FrameTypeCheck::Enabled)]
    #[case(None, FrameTypeCheck::Enabled)]
    fn env_value_controls_type_check(
        #[case] value: Option<&str>,
        #[case] expected: FrameTypeCheck,
    ) {
        assert_eq!(FrameTypeCheck::from_env_value(value), expected);
    }

    #[test]
    fn process_default_is_stable() {
        assert_eq!(
            FrameTypeCheck::process_default(),
            FrameTypeCheck::process_default()
        );
    }

    #[rstest]
    #[case(MIN_FRAGMENT_SIZE - 1, 1024)]
    #[case(MAX_FRAME_SIZE + 1, 1024)]
    #[case(64, 0)]
    #[case(1024, 100)]
    #[case(65, 64)]
    fn new_rejects_unusable_limits(#[case] fragment: usize, #[case] assembled: usize) {
        assert!(FramingConfig::new(fragment, assembled).is_none());
    }

    #[test]
    fn new_accepts_minimum_fragment_size() {
        let config = FramingConfig::new(MIN_FRAGMENT_SIZE, 1024)
            .expect("minimum fragment size should be accepted")
            .with_type_check(FrameTypeCheck::Disabled);
        assert_eq!(
            config.max_fragment_size.map(NonZeroUsize::get),
            Some(MIN_FRAGMENT_SIZE)
        );
        assert_eq!(config.codec().type_check(), FrameTypeCheck::Disabled);
    }

    #[test]
    fn new_accepts_fragment_size_equal_to_assembled_cap() {
        let config = FramingConfig::new(64, 64).expect("equal limits should be accepted");
        assert_eq!(config.max_fragment_size.map(NonZeroUsize::get), Some(64));
        assert_eq!(config.max_assembled_size.get(), 64);
    }

    #[test]
    fn default_does_not_fragment() {
        let config = FramingConfig::default();
        assert!(config.max_fragment_size.is_none());
        assert_eq!(config.max_assembled_size.get(), DEFAULT_MAX_ASSEMBLED_SIZE);
    }
}
