// ============================================================================
// LOADER: background decoding with generation tickets
// ============================================================================
//
// Decodes run on the rayon pool and report back over an mpsc channel. The
// owner drains the channel on its own thread with `drain()`; session state is
// never touched from a worker.

use std::path::PathBuf;
use std::sync::mpsc;

use crate::canvas::RegionSlot;
use crate::error::Result;
use crate::io::{self, SourceImage};

/// Identifies one load request. A result is applied only if the target
/// region's generation still equals `generation`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    pub slot: RegionSlot,
    pub generation: u64,
}

/// Where the bytes come from.
#[derive(Clone, Debug)]
pub enum LoadSource {
    Path(PathBuf),
    Bytes { data: Vec<u8>, name: Option<String> },
}

/// A finished decode, successful or not.
#[derive(Debug)]
pub struct LoadResult {
    pub ticket: LoadTicket,
    pub result: Result<SourceImage>,
}

pub struct Loader {
    sender: mpsc::Sender<LoadResult>,
    receiver: mpsc::Receiver<LoadResult>,
    in_flight: usize,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver,
            in_flight: 0,
        }
    }

    /// Number of requests spawned and not yet drained.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn spawn(&mut self, ticket: LoadTicket, source: LoadSource) {
        let sender = self.sender.clone();
        self.in_flight += 1;
        rayon::spawn(move || {
            let result = match source {
                LoadSource::Path(path) => io::open_image(&path),
                LoadSource::Bytes { data, name } => {
                    io::decode_image(&data).map(|image| SourceImage { image, name })
                }
            };
            // Receiver gone means the project was dropped.
            let _ = sender.send(LoadResult { ticket, result });
        });
    }

    /// Every result that has arrived so far, without blocking.
    pub fn drain(&mut self) -> Vec<LoadResult> {
        let mut out = Vec::new();
        while let Ok(result) = self.receiver.try_recv() {
            out.push(result);
        }
        self.in_flight = self.in_flight.saturating_sub(out.len());
        out
    }

    /// Block until the next result arrives.
    pub fn wait(&mut self) -> Option<LoadResult> {
        if self.in_flight == 0 {
            return None;
        }
        let result = self.receiver.recv().ok()?;
        self.in_flight -= 1;
        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_pixel(4, 4, Rgba([1, 2, 3, 255]));
        io::encode_png(&img).unwrap()
    }

    #[test]
    fn spawn_then_wait_returns_ticketed_result() {
        let mut loader = Loader::new();
        let ticket = LoadTicket {
            slot: RegionSlot::Top,
            generation: 7,
        };
        loader.spawn(
            ticket,
            LoadSource::Bytes {
                data: png_bytes(),
                name: Some("a.png".into()),
            },
        );
        assert_eq!(loader.in_flight(), 1);

        let done = loader.wait().unwrap();
        assert_eq!(done.ticket, ticket);
        let src = done.result.unwrap();
        assert_eq!(src.image.dimensions(), (4, 4));
        assert_eq!(src.name.as_deref(), Some("a.png"));
        assert_eq!(loader.in_flight(), 0);
        assert!(loader.wait().is_none());
    }

    #[test]
    fn decode_failure_is_reported_not_swallowed() {
        let mut loader = Loader::new();
        let ticket = LoadTicket {
            slot: RegionSlot::Whole,
            generation: 1,
        };
        loader.spawn(
            ticket,
            LoadSource::Bytes {
                data: vec![0, 1, 2],
                name: None,
            },
        );
        let done = loader.wait().unwrap();
        assert!(done.result.is_err());
    }
}
