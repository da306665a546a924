//! # ytdl-setup
//!
//! This crate drives [yt-dlp](https://github.com/yt-dlp/yt-dlp) and FFmpeg to
//! save videos and audio locally. Neither tool is bundled: before anything is
//! downloaded the crate checks that both can be run, and offers to install
//! whatever is missing.
//!
//! ## Usage
//!
//! Provisioning needs a prober, someone to ask (the [`operator::Operator`]),
//! and a search path to extend (the [`env::EnvContext`]).
//!
//! ```no_run
//! use ytdl_setup::{
//!     config::Config, env::ProcessEnv, ffmpeg, operator::TerminalOperator,
//!     platform::PlatformProfile, probe::CommandProbe, provision::Provisioner, util, worker,
//!     ytdlp,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let platform = PlatformProfile::current();
//!     let config = Config::for_platform(platform);
//!     let client = util::HttpClient::new().unwrap();
//!     let operator = TerminalOperator::new();
//!     let mut env = ProcessEnv::new(platform);
//!
//!     let requirements = [
//!         ytdlp::requirement(),
//!         ffmpeg::requirement(&config.ffmpeg_archive_url),
//!     ];
//!     let ready = Provisioner {
//!         platform,
//!         prober: &CommandProbe,
//!         operator: &operator,
//!         env: &mut env,
//!         client: &client,
//!         config: &config,
//!     }
//!     .ensure_ready(&requirements)
//!     .await;
//!
//!     if ready {
//!         worker::start(&operator, &env, &config).await;
//!     }
//! }
//! ```
//!
//! On Windows a missing FFmpeg is fetched as a zip build and copied into
//! `~/ffmpeg`; on macOS and Linux the operator gets package manager commands
//! instead. yt-dlp is installed through pip everywhere.

#[forbid(unsafe_code)]
#[macro_use]
extern crate log;

pub mod archive;
pub mod config;
pub mod env;
pub mod ffmpeg;
pub mod installer;
pub mod operator;
pub mod platform;
pub mod probe;
pub mod provision;
pub mod stats;
pub mod tool;
pub mod util;
pub mod worker;
pub mod ytdlp;

#[cfg(test)]
pub(crate) mod testing;
