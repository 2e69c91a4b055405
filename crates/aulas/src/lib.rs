//! ┌──────────────┐   best    ┌─────────────┐  segments  ┌───────────────┐
//! │   Primary    ├──────────►│  Manifest   ├───────────►│ Segment Pool  │
//! │   origin     │           │  Resolver   │            │  [N workers]  │
//! └──────────────┘           └─────────────┘            └───────┬───────┘
//!        ▲                                                      │ staging/
//!        │ second-best                                          ▼
//! ┌──────┴───────┐  duration <= 10s  ┌─────────────┐    ┌───────────────┐
//! │  Secondary   │◄──────────────────┤   Probe     │◄───┤    Remux      │
//! │  CDN origin  │                   │  (ffprobe)  │    │   (ffmpeg)    │
//! └──────────────┘                   └─────────────┘    └───────────────┘

pub mod coordinator;
pub mod download;
pub mod error;
mod fetch;
pub mod hls;
pub mod merge;
pub mod probe;
pub mod source;
pub mod staging;
pub mod util;

pub use coordinator::{Coordinator, DownloadStatus, Origin};
pub use error::*;
pub use source::MediaSource;
pub use util::http::HttpClient;
