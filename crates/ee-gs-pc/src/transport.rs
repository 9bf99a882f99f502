//! Tracing transport: stands in for the GIF/DMA hardware on a PC.
//!
//! Every submission is logged with its word count; waits return
//! immediately. Useful for eyeballing per-frame command volume without a
//! console attached.

use ee_gs_hal::{DisplayConfig, GifTransport, GraphControl};

#[derive(Debug)]
pub enum TraceError {}

#[derive(Default)]
pub struct TraceTransport {
    chains_sent: u64,
    words_sent: u64,
}

impl TraceTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GifTransport for TraceTransport {
    type Error = TraceError;

    fn send_normal(&mut self, words: &[u64]) -> Result<(), Self::Error> {
        self.words_sent += words.len() as u64;
        log::debug!("send normal: {} words", words.len());
        Ok(())
    }

    fn send_chain(&mut self, words: &[u64]) -> Result<(), Self::Error> {
        self.chains_sent += 1;
        self.words_sent += words.len() as u64;
        log::debug!(
            "send chain #{}: {} words, {} total",
            self.chains_sent,
            words.len(),
            self.words_sent
        );
        Ok(())
    }

    fn wait_idle(&mut self) {}
}

impl GraphControl for TraceTransport {
    fn set_output(&mut self, cfg: &DisplayConfig) {
        log::info!(
            "display output: {}x{} at word address {:#x}",
            cfg.width,
            cfg.height,
            cfg.address
        );
    }

    fn wait_finish(&mut self) {}

    fn wait_vsync(&mut self) {}
}
