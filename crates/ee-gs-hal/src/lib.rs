#![no_std]

//! Abstracts the GIF/DMA transfer path and the display control signals so the
//! backend can run against real hardware, an emulator, or a test capture.

/// The asynchronous transfer channel that moves command packets from host
/// memory into the rasterizer.
///
/// Implementations own the channel state. `send_*` hands a packet to the
/// hardware and returns without waiting for completion; `wait_idle` blocks
/// until whatever was previously in flight has fully drained.
pub trait GifTransport {
    type Error: core::fmt::Debug;

    /// Send a normal-mode transfer: raw qwords with no chain tags, length
    /// taken from the slice. Used for one-shot setup packets.
    fn send_normal(&mut self, words: &[u64]) -> Result<(), Self::Error>;

    /// Send a chain-mode transfer: the packet starts with a transfer
    /// descriptor tag recording its own length.
    fn send_chain(&mut self, words: &[u64]) -> Result<(), Self::Error>;

    /// Block until the channel is idle. No timeout: a stalled transfer unit
    /// stalls the caller indefinitely.
    fn wait_idle(&mut self);
}

/// Output configuration programmed once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Word address of the color surface in device memory.
    pub address: u32,
    pub width: u32,
    pub height: u32,
    /// Pixel storage mode of the color surface.
    pub psm: u8,
}

/// Display and synchronization signals outside the GIF data path.
pub trait GraphControl {
    /// Program the rasterizer's global output registers (scanout address,
    /// dimensions). Runs exactly once before any drawing.
    fn set_output(&mut self, cfg: &DisplayConfig);

    /// Block until the rasterizer signals all submitted drawing complete.
    fn wait_finish(&mut self);

    /// Block until the display's vertical sync signal.
    fn wait_vsync(&mut self);
}
