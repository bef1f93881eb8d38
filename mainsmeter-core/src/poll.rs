//! Poll orchestrator
//!
//! Sequences one fetch -> extract -> render cycle. The latest valid
//! sample seen within a cycle wins; a cycle with no sample (fetch error
//! or label absent) completes without touching the display, and the next
//! cycle starts on the normal schedule. Best-effort, skip on miss.

use embedded_hal_async::delay::DelayNs;

use crate::config::{BLINK_INTERVAL_MS, BLINK_TICKS, REQUEST, WEB_HOST, WEB_PORT};
use crate::extract::{extract_frequency, ExtractOutcome};
use crate::fetch::fetch_response;
use crate::render::Renderer;
use crate::traits::{DisplayError, SecureChannel, SegmentDisplay};

/// Poll loop state: the renderer (which owns the persistent display
/// state) and the inter-tick delay
pub struct PollLoop<D, T> {
    renderer: Renderer<D>,
    delay: T,
    blink_ticks: u16,
}

impl<D: SegmentDisplay, T: DelayNs> PollLoop<D, T> {
    pub fn new(renderer: Renderer<D>, delay: T) -> Self {
        Self {
            renderer,
            delay,
            blink_ticks: BLINK_TICKS,
        }
    }

    /// Override the per-cycle tick count (test hook)
    pub fn with_blink_ticks(mut self, ticks: u16) -> Self {
        self.blink_ticks = ticks;
        self
    }

    /// Run one poll cycle over a fresh channel
    ///
    /// Returns the sample rendered this cycle, or `None` when the cycle
    /// was skipped (fetch error or no match in the response). Display
    /// write failures are contract violations and propagate as fatal.
    pub async fn run_cycle<C: SecureChannel>(
        &mut self,
        channel: C,
    ) -> Result<Option<f32>, DisplayError> {
        let mut sample: Option<f32> = None;

        let fetched = fetch_response(channel, WEB_HOST, WEB_PORT, REQUEST.as_bytes(), |chunk| {
            // Later matches within the same cycle overwrite earlier ones
            if let Ok(ExtractOutcome::Found(freq)) = extract_frequency(chunk) {
                sample = Some(freq);
            }
        })
        .await;

        if let Err(_e) = fetched {
            // Not fatal: the next cycle retries on its own schedule
            #[cfg(feature = "defmt")]
            defmt::warn!("Fetch failed: {}, skipping cycle", _e);
            sample = None;
        }

        #[cfg(feature = "defmt")]
        match sample {
            Some(freq) => defmt::info!("Frequency: {} Hz", freq),
            None => defmt::warn!("No frequency sample this cycle"),
        }

        for tick in 0..self.blink_ticks {
            if let Some(freq) = sample {
                self.renderer.render_frequency(freq, tick % 2 == 1)?;
            }
            self.delay.delay_ms(BLINK_INTERVAL_MS).await;
        }

        Ok(sample)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{FetchError, ReadEvent, VerifyOutcome};
    use embassy_futures::block_on;

    struct NoopDelay;

    impl DelayNs for NoopDelay {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    /// Display double that records every frequency render
    struct RecordingDisplay {
        cells: [u8; 4],
        cell_log: heapless::Vec<[u8; 4], 8>,
    }

    impl RecordingDisplay {
        fn new() -> Self {
            Self {
                cells: [0; 4],
                cell_log: heapless::Vec::new(),
            }
        }
    }

    impl SegmentDisplay for RecordingDisplay {
        fn set_brightness(&mut self, _level: u8) -> Result<(), DisplayError> {
            Ok(())
        }

        fn set_cell_raw(&mut self, cell: u8, segments: u8) -> Result<(), DisplayError> {
            self.cells[cell as usize] = segments;
            if cell == 3 {
                self.cell_log.push(self.cells).unwrap();
            }
            Ok(())
        }
    }

    /// Channel that serves a fixed chunk script, or refuses to connect
    struct ScriptedChannel {
        refuse_connect: bool,
        chunks: &'static [&'static [u8]],
        next: usize,
        closes: usize,
    }

    impl SecureChannel for &mut ScriptedChannel {
        async fn connect(&mut self, _host: &str, _port: u16) -> Result<(), FetchError> {
            if self.refuse_connect {
                Err(FetchError::ConnectFailed)
            } else {
                Ok(())
            }
        }

        async fn handshake(&mut self) -> Result<(), FetchError> {
            Ok(())
        }

        fn verify_peer(&mut self) -> VerifyOutcome {
            VerifyOutcome::Unverified
        }

        async fn send(&mut self, data: &[u8]) -> Result<usize, FetchError> {
            Ok(data.len())
        }

        async fn recv(&mut self, buf: &mut [u8]) -> Result<ReadEvent, FetchError> {
            if self.next >= self.chunks.len() {
                return Ok(ReadEvent::Closed);
            }
            let chunk = self.chunks[self.next];
            self.next += 1;
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(ReadEvent::Data(chunk.len()))
        }

        async fn close(&mut self) {
            self.closes += 1;
        }
    }

    // Label at offset 4; the numeric window must fit with padding behind it
    const PAYLOAD: &[u8] =
        b"....Freq:</b>     50.01 Hz                                        ";

    #[test]
    fn cycle_renders_the_extracted_sample() {
        let mut channel = ScriptedChannel {
            refuse_connect: false,
            chunks: &[b"foo", PAYLOAD],
            next: 0,
            closes: 0,
        };

        let mut poll =
            PollLoop::new(Renderer::new(RecordingDisplay::new()), NoopDelay).with_blink_ticks(2);
        let rendered = block_on(poll.run_cycle(&mut channel)).unwrap();

        let freq = rendered.expect("sample should have been extracted");
        assert!((freq - 50.01).abs() < 1e-3);
        // One render per tick, dots toggling between them
        let log = &poll.renderer.release().cell_log;
        assert_eq!(log.len(), 2);
        assert_ne!(log[0], log[1]);
        assert_eq!(channel.closes, 1);
    }

    #[test]
    fn connect_failure_skips_the_render() {
        let mut channel = ScriptedChannel {
            refuse_connect: true,
            chunks: &[PAYLOAD],
            next: 0,
            closes: 0,
        };

        let mut poll =
            PollLoop::new(Renderer::new(RecordingDisplay::new()), NoopDelay).with_blink_ticks(2);
        let rendered = block_on(poll.run_cycle(&mut channel)).unwrap();

        assert_eq!(rendered, None);
        assert_eq!(poll.renderer.release().cell_log.len(), 0);
        // The failed session was still torn down
        assert_eq!(channel.closes, 1);
    }

    #[test]
    fn response_without_label_completes_the_cycle() {
        let mut channel = ScriptedChannel {
            refuse_connect: false,
            chunks: &[b"nothing to see here"],
            next: 0,
            closes: 0,
        };

        let mut poll =
            PollLoop::new(Renderer::new(RecordingDisplay::new()), NoopDelay).with_blink_ticks(2);
        let rendered = block_on(poll.run_cycle(&mut channel)).unwrap();

        assert_eq!(rendered, None);
        assert_eq!(poll.renderer.release().cell_log.len(), 0);
        assert_eq!(channel.closes, 1);
    }
}
