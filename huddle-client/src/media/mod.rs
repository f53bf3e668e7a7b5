mod source;

pub use source::{LocalTrack, MediaProvider, MediaSource, StaticMediaProvider};
