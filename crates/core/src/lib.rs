//! Voiceweave core: weaves short spoken clips into one stereo soundscape.
//!
//! Two independently shuffled streams of the same clips are sequenced on
//! the left and right sides, colored with alternating profiles, and mixed
//! with a scripted intro and an offset between the streams.

pub mod audio;
pub mod error;
pub mod names;
pub mod types;
pub mod weave;

pub use error::WeaveError;
pub use types::{Clip, PlanEntry, Position, Profile, WeavePlan, WeaveResult};
pub use weave::config::WeaveConfig;
pub use weave::process::{plan_weave, render_weave, weave, PreparedWeave};
